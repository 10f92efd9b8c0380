//! `filesystems` table queries — immutable after job submission.

use rusqlite::{params, Connection};
use shepherd_core::errors::StorageError;

use super::sqe;

#[derive(Debug, Clone)]
pub struct FilesystemRecord {
    pub id: i64,
    pub name: String,
    pub driver_key: String,
    pub options: String,
    pub max_concurrency: i64,
}

pub fn insert_filesystem(
    conn: &Connection,
    name: &str,
    driver_key: &str,
    options: &str,
    max_concurrency: i64,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO filesystems (name, driver_key, options, max_concurrency)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, driver_key, options, max_concurrency],
    )
    .map_err(sqe)?;
    Ok(conn.last_insert_rowid())
}

pub fn get_filesystem_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<FilesystemRecord>, StorageError> {
    conn.query_row(
        "SELECT id, name, driver_key, options, max_concurrency FROM filesystems WHERE name = ?1",
        params![name],
        |row| {
            Ok(FilesystemRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                driver_key: row.get(2)?,
                options: row.get(3)?,
                max_concurrency: row.get(4)?,
            })
        },
    )
    .optional_storage()
}

trait OptionalStorage<T> {
    fn optional_storage(self) -> Result<Option<T>, StorageError>;
}

impl<T> OptionalStorage<T> for rusqlite::Result<T> {
    fn optional_storage(self) -> Result<Option<T>, StorageError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(sqe(e)),
        }
    }
}
