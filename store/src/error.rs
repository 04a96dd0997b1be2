//! Outcome classification for store operations.
//!
//! Every operation runs one statement and sorts its result into exactly one
//! of these kinds. Zero matched rows never says *why* nothing matched.

use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected an insert.
    #[error("{op}: record already exists")]
    Conflict { op: &'static str },
    /// The credential or ownership predicate matched nothing.
    #[error("{op}: credentials rejected")]
    Unauthorized { op: &'static str },
    /// A lookup or keyed update without an ownership predicate matched nothing.
    #[error("{op}: {entity} not found")]
    NotFound {
        op: &'static str,
        entity: &'static str,
    },
    /// A single-entity statement touched more rows than it may.
    #[error("{op}: expected one row, store reported {rows}")]
    Integrity { op: &'static str, rows: usize },
    #[error("{op}: store failure")]
    Fatal {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// Classify a driver error raised while executing `op`.
    ///
    /// Unique and primary-key violations become `Conflict`. A rejected
    /// foreign key means the referenced parent is absent. Everything else is
    /// fatal.
    pub(crate) fn from_sqlite(
        op: &'static str,
        parent: &'static str,
        err: rusqlite::Error,
    ) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err
            && failure.code == ErrorCode::ConstraintViolation
        {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::Conflict { op };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::NotFound { op, entity: parent };
                }
                _ => {}
            }
        }
        tracing::error!(op, error = %err, "store statement failed");
        StoreError::Fatal { op, source: err }
    }

    /// True for failures that do not depend on the submitted credentials or
    /// state and should be surfaced as internal errors.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Fatal { .. } | StoreError::Integrity { .. }
        )
    }

    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            StoreError::Conflict { op }
            | StoreError::Unauthorized { op }
            | StoreError::NotFound { op, .. }
            | StoreError::Integrity { op, .. }
            | StoreError::Fatal { op, .. } => op,
        }
    }
}

/// What a zero-row result means for a given statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Unauthorized,
    NotFound(&'static str),
}

impl Rejection {
    pub(crate) fn into_error(self, op: &'static str) -> StoreError {
        match self {
            Rejection::Unauthorized => StoreError::Unauthorized { op },
            Rejection::NotFound(entity) => StoreError::NotFound { op, entity },
        }
    }
}
