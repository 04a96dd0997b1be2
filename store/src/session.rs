//! Store session: one SQLite connection plus its prepared statement set.
//!
//! A session is opened once per worker and passed to the managers by
//! reference. Concurrent callers each open their own session on the same
//! database file; the store's row locking is the only coordination.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{CachedStatement, Connection, OptionalExtension, Params, Row};

use consulate_types::{
    DEFAULT_BUSY_TIMEOUT, EmptyIdError, NetworkUid, NodeUid, RecoveryWindow,
};

use crate::account::AccountManager;
use crate::db_files::prepare_db_path;
use crate::error::{Rejection, StoreError, StoreResult};
use crate::network::NetworkManager;
use crate::node::NodeManager;
use crate::statements::Statement;

/// Tunables applied when a session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long a statement waits on another session's write lock.
    pub busy_timeout: Duration,
    pub recovery: RecoveryWindow,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            recovery: RecoveryWindow::default(),
        }
    }
}

pub struct Session {
    db: Connection,
    /// `datetime('now', ..)` modifier for the recovery re-issue interval.
    reissue_after: String,
    /// `datetime('now', ..)` modifier for the recovery redemption window.
    redeem_within: String,
}

impl Session {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS account (
            email TEXT PRIMARY KEY NOT NULL,
            password TEXT NOT NULL,
            apikey TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            recover_key TEXT,
            recover_date TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((recover_key IS NULL) = (recover_date IS NULL))
        );

        CREATE TABLE IF NOT EXISTS network (
            uid TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            description TEXT NOT NULL,
            subnet TEXT NOT NULL,
            netmask TEXT NOT NULL,
            ipv4_last TEXT,
            embassy_certificate TEXT NOT NULL,
            embassy_privatekey TEXT NOT NULL,
            embassy_serial INTEGER NOT NULL,
            passport_certificate TEXT NOT NULL,
            passport_privatekey TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (email, description)
        );

        CREATE TABLE IF NOT EXISTS node (
            uid TEXT PRIMARY KEY NOT NULL,
            network_uid TEXT NOT NULL
                REFERENCES network(uid) ON DELETE CASCADE ON UPDATE CASCADE,
            provision_key TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            ipsrc TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (network_uid, description)
        );
    ";

    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self> {
        let path = path.as_ref();
        prepare_db_path(path)?;

        let db = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let session = Self::initialize(db, options)?;
        tracing::info!(path = %path.display(), "Store session opened");
        Ok(session)
    }

    /// Open a private in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(SessionOptions::default())
    }

    pub fn open_in_memory_with(options: SessionOptions) -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::initialize(db, options)
    }

    fn initialize(db: Connection, options: SessionOptions) -> Result<Self> {
        db.busy_timeout(options.busy_timeout)
            .context("Failed to set store busy timeout")?;
        db.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )
        .context("Failed to set store pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create store schema")?;

        db.set_prepared_statement_cache_capacity(Statement::ALL.len());
        for statement in Statement::ALL {
            db.prepare_cached(statement.sql())
                .with_context(|| format!("Failed to prepare {} statement", statement.name()))?;
        }

        Ok(Self {
            db,
            reissue_after: past_offset(options.recovery.reissue_after()),
            redeem_within: past_offset(options.recovery.redeem_within()),
        })
    }

    #[must_use]
    pub fn accounts(&self) -> AccountManager<'_> {
        AccountManager::new(self)
    }

    #[must_use]
    pub fn networks(&self) -> NetworkManager<'_> {
        NetworkManager::new(self)
    }

    #[must_use]
    pub fn nodes(&self) -> NodeManager<'_> {
        NodeManager::new(self)
    }

    /// Release the statement set and close the connection.
    pub fn close(self) -> Result<()> {
        self.db.flush_prepared_statement_cache();
        self.db
            .close()
            .map_err(|(_, err)| err)
            .context("Failed to close store")?;
        tracing::info!("Store session closed");
        Ok(())
    }

    pub(crate) fn reissue_after(&self) -> &str {
        &self.reissue_after
    }

    pub(crate) fn redeem_within(&self) -> &str {
        &self.redeem_within
    }

    fn prepared(&self, statement: Statement) -> StoreResult<CachedStatement<'_>> {
        self.db
            .prepare_cached(statement.sql())
            .map_err(|err| StoreError::from_sqlite(statement.name(), statement.parent(), err))
    }

    /// Run a mutation whose success is exactly one affected row.
    pub(crate) fn execute_one<P: Params>(
        &self,
        statement: Statement,
        params: P,
        rejection: Rejection,
    ) -> StoreResult<()> {
        let op = statement.name();
        let rows = self
            .prepared(statement)?
            .execute(params)
            .map_err(|err| StoreError::from_sqlite(op, statement.parent(), err))?;
        match rows {
            1 => Ok(()),
            0 => Err(rejected(op, rejection)),
            rows => {
                tracing::error!(op, rows, "single-row statement touched several rows");
                Err(StoreError::Integrity { op, rows })
            }
        }
    }

    /// Run a statement that yields at most one row (a lookup, or a mutation
    /// with `RETURNING`).
    pub(crate) fn query_one<P, T, F>(
        &self,
        statement: Statement,
        params: P,
        rejection: Rejection,
        map: F,
    ) -> StoreResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let op = statement.name();
        self.prepared(statement)?
            .query_row(params, map)
            .optional()
            .map_err(|err| StoreError::from_sqlite(op, statement.parent(), err))?
            .ok_or_else(|| rejected(op, rejection))
    }

    /// Step a query, handing each mapped row to `visit` as it is produced.
    ///
    /// Returns the number of rows visited.
    pub(crate) fn query_each<P, T, F, V>(
        &self,
        statement: Statement,
        params: P,
        mut map: F,
        mut visit: V,
    ) -> StoreResult<usize>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
        V: FnMut(T),
    {
        let op = statement.name();
        let fail = |err: rusqlite::Error| StoreError::from_sqlite(op, statement.parent(), err);

        let mut stmt = self.prepared(statement)?;
        let mut rows = stmt.query(params).map_err(fail)?;
        let mut count = 0;
        while let Some(row) = rows.next().map_err(fail)? {
            visit(map(row).map_err(fail)?);
            count += 1;
        }
        Ok(count)
    }

    #[cfg(test)]
    pub(crate) fn raw(&self) -> &Connection {
        &self.db
    }
}

fn rejected(op: &'static str, rejection: Rejection) -> StoreError {
    tracing::debug!(op, "conditional statement matched no rows");
    rejection.into_error(op)
}

/// SQLite time modifier reaching `duration` into the past.
fn past_offset(duration: Duration) -> String {
    format!("-{} seconds", duration.as_secs())
}

pub(crate) fn network_uid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NetworkUid> {
    NetworkUid::new(row.get::<_, String>(idx)?).map_err(|err| conversion_error(idx, err))
}

pub(crate) fn node_uid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NodeUid> {
    NodeUid::new(row.get::<_, String>(idx)?).map_err(|err| conversion_error(idx, err))
}

fn conversion_error(idx: usize, err: EmptyIdError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}
