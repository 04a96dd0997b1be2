//! Ownership predicate shared by every owner-scoped statement.
//!
//! Authorization is a SQL fragment embedded in the statement that reads or
//! mutates, never a separate query issued first. The fragments are macros so
//! they compose into `&'static str` statement text at compile time.

use rusqlite::ToSql;

use consulate_types::AccountStatus;

static ACTIVE_STATUS: i64 = AccountStatus::Active.code();

/// The caller's account matches the presented email and current API key.
macro_rules! owner_key_match {
    () => {
        "account.email = LOWER(:owner_email) AND account.apikey = :owner_apikey"
    };
}

/// Key match, and the account has been activated.
macro_rules! active_owner {
    () => {
        concat!(
            $crate::authz::owner_key_match!(),
            " AND account.status = :owner_active"
        )
    };
}

/// Uids of the network named `:network_description` owned by an active owner.
macro_rules! owned_network_uids {
    () => {
        concat!(
            "SELECT network.uid FROM network \
             JOIN account ON account.email = network.email \
             WHERE network.description = :network_description AND ",
            $crate::authz::active_owner!()
        )
    };
}

pub(crate) use {active_owner, owned_network_uids, owner_key_match};

/// Credential pair presented to prove ownership of an account's networks.
#[derive(Clone, Copy)]
pub struct OwnerProof<'a> {
    email: &'a str,
    apikey: &'a str,
}

impl<'a> OwnerProof<'a> {
    #[must_use]
    pub fn new(email: &'a str, apikey: &'a str) -> Self {
        Self { email, apikey }
    }

    /// Bindings for [`owner_key_match!`].
    pub(crate) fn key_params(&self) -> [(&'static str, &dyn ToSql); 2] {
        [(":owner_email", &self.email), (":owner_apikey", &self.apikey)]
    }

    /// Bindings for [`active_owner!`] and [`owned_network_uids!`].
    pub(crate) fn active_params(&self) -> [(&'static str, &dyn ToSql); 3] {
        [
            (":owner_email", &self.email),
            (":owner_apikey", &self.apikey),
            (":owner_active", &ACTIVE_STATUS),
        ]
    }
}

impl std::fmt::Debug for OwnerProof<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerProof")
            .field("email", &self.email)
            .field("apikey", &"<redacted>")
            .finish()
    }
}
