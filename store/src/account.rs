//! Account credentials: creation, activation, API-key rotation and password
//! recovery.
//!
//! Each operation is one conditional `UPDATE` (or `INSERT`) whose predicate
//! carries the whole precondition. Success is exactly one affected row; a
//! wrong secret, a wrong status and an unknown email all look the same.

use rusqlite::named_params;

use consulate_types::AccountStatus;

use crate::error::{Rejection, StoreResult};
use crate::session::Session;
use crate::statements::Statement;

pub struct AccountManager<'s> {
    session: &'s Session,
}

impl<'s> AccountManager<'s> {
    #[must_use]
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Register a pending account. Fails with `Conflict` if the email is taken.
    pub fn create(&self, email: &str, password: &str, apikey: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::CreateAccount,
            named_params! {
                ":email": email,
                ":password": password,
                ":apikey": apikey,
                ":pending": AccountStatus::Pending.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Move a pending account to active, proving possession of its API key.
    ///
    /// An already active account is rejected like a wrong key.
    pub fn activate(&self, email: &str, apikey: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::ActivateAccount,
            named_params! {
                ":email": email,
                ":apikey": apikey,
                ":active": AccountStatus::Active.code(),
                ":pending": AccountStatus::Pending.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Replace the API key of an active account by proving the password.
    pub fn set_apikey(&self, email: &str, password: &str, new_apikey: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::SetApikey,
            named_params! {
                ":new_apikey": new_apikey,
                ":email": email,
                ":password": password,
                ":active": AccountStatus::Active.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Replace the API key of an active account by proving the current key.
    pub fn reset_apikey(&self, email: &str, apikey: &str, new_apikey: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::ResetApikey,
            named_params! {
                ":new_apikey": new_apikey,
                ":email": email,
                ":apikey": apikey,
                ":active": AccountStatus::Active.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Issue a recovery key, at most once per re-issue interval.
    ///
    /// Rejected while a recent key is outstanding, for pending accounts and
    /// for unknown emails alike.
    pub fn begin_recovery(&self, email: &str, recover_key: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::BeginRecovery,
            named_params! {
                ":recover_key": recover_key,
                ":email": email,
                ":reissue_after": self.session.reissue_after(),
                ":active": AccountStatus::Active.code(),
            },
            Rejection::Unauthorized,
        )
    }

    /// Redeem a recovery key for a new password.
    ///
    /// The key is cleared by the statement that validates it, so it works once.
    pub fn complete_recovery(
        &self,
        email: &str,
        new_password: &str,
        recover_key: &str,
    ) -> StoreResult<()> {
        self.session.execute_one(
            Statement::CompleteRecovery,
            named_params! {
                ":password": new_password,
                ":email": email,
                ":recover_key": recover_key,
                ":redeem_within": self.session.redeem_within(),
                ":active": AccountStatus::Active.code(),
            },
            Rejection::Unauthorized,
        )
    }
}
