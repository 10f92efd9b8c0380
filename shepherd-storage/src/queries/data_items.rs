//! `data_items` table queries. A DataItem is created on first reference
//! and never mutated — lookup-or-insert is the only write path.

use rusqlite::{params, Connection};
use shepherd_core::errors::StorageError;
use shepherd_core::model::Checksum;

use super::sqe;

#[derive(Debug, Clone)]
pub struct DataItemRecord {
    pub id: i64,
    pub filesystem_id: i64,
    pub address: String,
    pub size: Option<i64>,
}

/// Returns the existing row for `(filesystem_id, address)` if present,
/// otherwise inserts one with no size/checksums/metadata yet attached.
pub fn get_or_create_data_item(
    conn: &Connection,
    filesystem_id: i64,
    address: &str,
) -> Result<DataItemRecord, StorageError> {
    let existing = conn
        .query_row(
            "SELECT id, filesystem_id, address, size FROM data_items
             WHERE filesystem_id = ?1 AND address = ?2",
            params![filesystem_id, address],
            |row| {
                Ok(DataItemRecord {
                    id: row.get(0)?,
                    filesystem_id: row.get(1)?,
                    address: row.get(2)?,
                    size: row.get(3)?,
                })
            },
        )
        .optional_storage()?;

    if let Some(record) = existing {
        return Ok(record);
    }

    conn.execute(
        "INSERT INTO data_items (filesystem_id, address) VALUES (?1, ?2)",
        params![filesystem_id, address],
    )
    .map_err(sqe)?;
    let id = conn.last_insert_rowid();
    Ok(DataItemRecord { id, filesystem_id, address: address.to_string(), size: None })
}

/// Fills in `size` for a data item that doesn't have one yet. A no-op if
/// the row already carries a size — `DataItem`s are never mutated once a
/// field is set, only completed.
pub fn set_data_item_size(conn: &Connection, data_id: i64, size: i64) -> Result<(), StorageError> {
    if size < 0 {
        return Err(StorageError::InvariantViolation(format!("negative size {size} for data item {data_id}")));
    }
    conn.execute(
        "UPDATE data_items SET size = ?1 WHERE id = ?2 AND size IS NULL",
        params![size, data_id],
    )
    .map_err(sqe)?;
    Ok(())
}

/// Records a checksum for `(data_id, algorithm)`. A re-checksum under the
/// same algorithm replaces the prior row rather than accumulating a
/// history — checksums are keyed by `(data_id, algorithm)`, so a fresh
/// digest for an algorithm already on file *is* the new row for that key,
/// not a new keyed entry alongside it.
pub fn upsert_checksum(conn: &Connection, data_id: i64, algorithm: &str, checksum: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO data_item_checksums (data_id, algorithm, checksum) VALUES (?1, ?2, ?3)
         ON CONFLICT (data_id, algorithm) DO UPDATE SET checksum = excluded.checksum",
        params![data_id, algorithm, checksum],
    )
    .map_err(sqe)?;
    Ok(())
}

pub fn get_checksums(conn: &Connection, data_id: i64) -> Result<Vec<Checksum>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT algorithm, checksum FROM data_item_checksums WHERE data_id = ?1 ORDER BY algorithm")
        .map_err(sqe)?;
    let rows = stmt
        .query_map([data_id], |row| Ok(Checksum { algorithm: row.get(0)?, value: row.get(1)? }))
        .map_err(sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqe)
}

/// Sets one metadata `(key, value)` entry for a data item, replacing any
/// prior value under the same key.
pub fn upsert_metadata(conn: &Connection, data_id: i64, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO data_item_metadata (data_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT (data_id, key) DO UPDATE SET value = excluded.value",
        params![data_id, key, value],
    )
    .map_err(sqe)?;
    Ok(())
}

pub fn get_metadata(conn: &Connection, data_id: i64) -> Result<Vec<(String, String)>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT key, value FROM data_item_metadata WHERE data_id = ?1 ORDER BY key")
        .map_err(sqe)?;
    let rows = stmt.query_map([data_id], |row| Ok((row.get(0)?, row.get(1)?))).map_err(sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sqe)
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
