//! Credential and membership state for the provisioning service.
//!
//! Accounts, the networks they own and the nodes joined to those networks
//! live in one SQLite database. There is no lock manager: every operation is
//! a single conditional statement, and "exactly one row changed" is the
//! compare-and-swap success signal.
//!
//! # Architecture
//!
//! ```text
//! Session (connection + prepared statement set)
//! ├── accounts(): AccountManager   create / activate / rotate keys / recovery
//! ├── networks(): NetworkManager   create / lookup / list / embassy serial
//! └── nodes():    NodeManager      create / authorized delete / status
//!
//! authz: OwnerProof + SQL ownership fragments embedded in owner-scoped statements
//! ```
//!
//! Failure reasons are deliberately coarse: see [`StoreError`].

mod account;
mod authz;
mod db_files;
mod error;
mod network;
mod node;
mod session;
mod statements;

pub use account::AccountManager;
pub use authz::OwnerProof;
pub use error::{StoreError, StoreResult};
pub use network::NetworkManager;
pub use node::NodeManager;
pub use session::{Session, SessionOptions};
