use std::fmt;

use serde::{Deserialize, Serialize};

/// Activation state of an account.
///
/// Stored as an integer code. The only transition is `Pending -> Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Active,
}

impl AccountStatus {
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            AccountStatus::Pending => 0,
            AccountStatus::Active => 1,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(AccountStatus::Pending),
            1 => Some(AccountStatus::Active),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Pending => f.write_str("pending"),
            AccountStatus::Active => f.write_str("active"),
        }
    }
}

/// Caller-defined node status code.
///
/// The store never interprets the value; the named constants are the codes
/// the provisioning flow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeStatus(i64);

impl NodeStatus {
    pub const UNREGISTERED: Self = Self(0);
    pub const REGISTERED: Self = Self(1);

    #[must_use]
    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        self.0
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self::UNREGISTERED
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
