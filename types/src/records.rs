//! Values passed into and returned out of the managers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NetworkUid, NodeStatus, NodeUid};

/// Version counter of a network's embassy certificate material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbassySerial(i64);

impl EmbassySerial {
    /// Serial assigned to a freshly created network.
    pub const BASE: Self = Self(1);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EmbassySerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Certificate plus private key, both caller-generated and stored opaquely.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub certificate: String,
    pub private_key: String,
}

impl KeyPair {
    pub fn new(certificate: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Everything needed to register a network under an account.
#[derive(Debug, Clone)]
pub struct NewNetwork {
    pub uid: NetworkUid,
    pub description: String,
    pub subnet: String,
    pub netmask: String,
    pub embassy: KeyPair,
    pub passport: KeyPair,
}

/// Addressing details returned by an owner + description lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub uid: NetworkUid,
    pub subnet: String,
    pub netmask: String,
    pub ipv4_last: Option<String>,
}

/// One row of an account's network listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub uid: NetworkUid,
    pub description: String,
}

/// Embassy key material together with its current serial.
#[derive(Debug, Clone, Serialize)]
pub struct Embassy {
    pub keys: KeyPair,
    pub serial: EmbassySerial,
}

/// Identifiers of a node removed by an authorized delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedNode {
    pub node_uid: NodeUid,
    pub network_uid: NetworkUid,
}

/// One row of a network's node listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub uid: NodeUid,
    pub description: String,
    pub status: NodeStatus,
    pub ipsrc: Option<String>,
}

/// Node located through its provisioning key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedNode {
    pub node_uid: NodeUid,
    pub network_uid: NetworkUid,
    pub description: String,
    pub status: NodeStatus,
}
