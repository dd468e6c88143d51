//! SQLite connection wrapper.
//!
//! Each handle owns one connection. Several handles may point at the same
//! file (one per request thread); SQLite serializes writers and the busy
//! timeout makes a blocked writer wait instead of failing immediately.

use crate::errors::AppResult;
use rusqlite::{Connection, Result, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: &str) -> Result<Self> {
        Self::with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT_MS)
    }

    pub fn with_busy_timeout(path: &str, busy_timeout_ms: u64) -> Result<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Run `func` as one unit of work.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE`, so the write lock is
    /// taken before the first read and a read-then-write on a record cannot
    /// interleave with another writer. `Ok` commits; `Err` rolls everything back.
    pub fn with_tx<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = func(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}
