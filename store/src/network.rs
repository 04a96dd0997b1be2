//! Networks and their embassy certificate serial.

use rusqlite::{Row, named_params};

use consulate_types::{
    Embassy, EmbassySerial, KeyPair, NetworkInfo, NetworkSummary, NetworkUid, NewNetwork,
};

use crate::authz::OwnerProof;
use crate::error::{Rejection, StoreResult};
use crate::session::{Session, network_uid_column};
use crate::statements::Statement;

const NETWORK: Rejection = Rejection::NotFound("network");

pub struct NetworkManager<'s> {
    session: &'s Session,
}

impl<'s> NetworkManager<'s> {
    #[must_use]
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Register a network owned by `email`, starting at [`EmbassySerial::BASE`].
    ///
    /// Fails with `Conflict` when the owner already has a network with this
    /// description or the uid is taken.
    pub fn create(&self, email: &str, network: &NewNetwork) -> StoreResult<()> {
        self.session.execute_one(
            Statement::CreateNetwork,
            named_params! {
                ":email": email,
                ":uid": network.uid.as_str(),
                ":description": network.description,
                ":subnet": network.subnet,
                ":netmask": network.netmask,
                ":embassy_certificate": network.embassy.certificate,
                ":embassy_privatekey": network.embassy.private_key,
                ":embassy_serial": EmbassySerial::BASE.value(),
                ":passport_certificate": network.passport.certificate,
                ":passport_privatekey": network.passport.private_key,
            },
            Rejection::Unauthorized,
        )
    }

    /// Look up an owner's network by description.
    pub fn get(&self, email: &str, description: &str) -> StoreResult<NetworkInfo> {
        self.session.query_one(
            Statement::GetNetwork,
            named_params! { ":email": email, ":description": description },
            NETWORK,
            |row| {
                Ok(NetworkInfo {
                    uid: network_uid_column(row, 0)?,
                    subnet: row.get(1)?,
                    netmask: row.get(2)?,
                    ipv4_last: row.get(3)?,
                })
            },
        )
    }

    /// Stream the networks of the account holding `proof`, one row at a time.
    ///
    /// A wrong key yields zero rows, exactly like an account without
    /// networks. Returns the number of rows visited.
    pub fn visit(
        &self,
        proof: OwnerProof<'_>,
        visit: impl FnMut(NetworkSummary),
    ) -> StoreResult<usize> {
        self.session.query_each(
            Statement::ListNetworks,
            proof.key_params().as_slice(),
            summary_row,
            visit,
        )
    }

    /// Collect the networks of the account holding `proof`.
    pub fn list(&self, proof: OwnerProof<'_>) -> StoreResult<Vec<NetworkSummary>> {
        let mut networks = Vec::new();
        self.visit(proof, |summary| networks.push(summary))?;
        Ok(networks)
    }

    /// Embassy material and serial by uid.
    ///
    /// No ownership check: callers distributing certificates across accounts
    /// must authorize the request themselves.
    pub fn embassy(&self, uid: &NetworkUid) -> StoreResult<Embassy> {
        self.session.query_one(
            Statement::GetEmbassy,
            named_params! { ":uid": uid.as_str() },
            NETWORK,
            |row| {
                Ok(Embassy {
                    keys: KeyPair::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    serial: EmbassySerial::new(row.get(2)?),
                })
            },
        )
    }

    /// Bump the embassy serial by one and return the value this call produced.
    ///
    /// The increment is relative, so concurrent advancers never lose one.
    pub fn advance_embassy_serial(&self, uid: &NetworkUid) -> StoreResult<EmbassySerial> {
        let serial = self.session.query_one(
            Statement::AdvanceEmbassySerial,
            named_params! { ":uid": uid.as_str() },
            NETWORK,
            |row| row.get(0).map(EmbassySerial::new),
        )?;
        tracing::debug!(network = %uid, %serial, "Embassy serial advanced");
        Ok(serial)
    }

    /// Record the last address handed out in this network.
    ///
    /// Trusted-caller path, keyed by uid only.
    pub fn record_ipv4_last(&self, uid: &NetworkUid, ipv4_last: &str) -> StoreResult<()> {
        self.session.execute_one(
            Statement::RecordIpv4Last,
            named_params! { ":ipv4_last": ipv4_last, ":uid": uid.as_str() },
            NETWORK,
        )
    }
}

fn summary_row(row: &Row<'_>) -> rusqlite::Result<NetworkSummary> {
    Ok(NetworkSummary {
        uid: network_uid_column(row, 0)?,
        description: row.get(1)?,
    })
}
