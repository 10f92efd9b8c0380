//! Connection management: pragma setup and schema initialization for a
//! single SQLite-backed state store.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use shepherd_core::errors::StorageError;

use crate::migrations;

fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(sqe)
}

/// Owns the single connection used for reads, writes, and the dispatch
/// loop's claim transactions. Multiple `DatabaseManager`s (one per
/// dispatcher process) may open the same file concurrently under WAL mode;
/// `BEGIN IMMEDIATE` at the claim step arbitrates across them.
pub struct DatabaseManager {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl DatabaseManager {
    /// Open (creating if absent) a file-backed store, applying pragmas and
    /// running migrations to the current schema version.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqe)?;
        apply_pragmas(&conn)?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path: Some(path.to_path_buf()), conn: Mutex::new(conn) })
    }

    /// Open an in-memory store — used for tests and short-lived planning
    /// runs.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqe)?;
        apply_pragmas(&conn)?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path: None, conn: Mutex::new(conn) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("database connection mutex poisoned");
        conn.pragma_update(None, "wal_checkpoint", "TRUNCATE").map_err(sqe)
    }

    /// Raw read access — for query functions not worth a dedicated method.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.conn.lock().expect("database connection mutex poisoned");
        f(&conn)
    }

    /// Raw write access, for a single statement or a caller-managed
    /// transaction.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.conn.lock().expect("database connection mutex poisoned");
        f(&conn)
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction, committing on `Ok`
    /// and rolling back on `Err`. This is the claim step's primitive —
    /// acquiring the write lock up front is what stands in for
    /// `FOR UPDATE SKIP LOCKED` under SQLite.
    pub fn with_immediate_transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T, StorageError>,
    {
        let mut conn = self.conn.lock().expect("database connection mutex poisoned");
        let tx = conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .map_err(sqe)?;
        let result = f(&tx)?;
        tx.commit().map_err(sqe)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_initializes_schema() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let count: i64 = db
            .with_reader(|conn| {
                conn.query_row("SELECT COUNT(*) FROM filesystems", [], |row| row.get(0))
                    .map_err(sqe)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn path_is_none_for_in_memory() {
        let db = DatabaseManager::open_in_memory().unwrap();
        assert!(db.path().is_none());
    }
}
