//! Core domain types for Consulate.
//!
//! Identifiers, status codes and the record shapes exchanged with the store.
//! Nothing here performs IO.

#![allow(clippy::missing_errors_doc)]

mod ids;
mod records;
mod recovery;
mod status;

use std::time::Duration;

use thiserror::Error;

pub use ids::{NetworkUid, NodeUid};
pub use records::{
    DeletedNode, Embassy, EmbassySerial, KeyPair, NetworkInfo, NetworkSummary, NewNetwork,
    NodeSummary, ProvisionedNode,
};
pub use recovery::RecoveryWindow;
pub use status::{AccountStatus, NodeStatus};

/// How long a statement waits on another session's write lock by default.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Error)]
#[error("{0} must not be empty")]
pub struct EmptyIdError(pub &'static str);
