//! `jobs` table queries: the two-phase (`prepare`, `transfer`) lifecycle
//! timestamps.

use rusqlite::{params, Connection};
use shepherd_core::errors::StorageError;

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: i64,
    pub client_ref: String,
    pub max_attempts: i64,
}

pub fn insert_job(
    conn: &Connection,
    client_ref: &str,
    max_attempts: i64,
    prepare_start_ms: i64,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO jobs (client_ref, max_attempts, prepare_start) VALUES (?1, ?2, ?3)",
        params![client_ref, max_attempts, prepare_start_ms],
    )
    .map_err(super::sqe)?;
    Ok(conn.last_insert_rowid())
}

/// Closes the `prepare` phase and opens `transfer` — called once task
/// expansion for the job has been fully persisted.
pub fn open_transfer_phase(
    conn: &Connection,
    job_id: i64,
    prepare_finish_ms: i64,
    transfer_start_ms: i64,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE jobs SET prepare_finish = ?1, transfer_start = ?2 WHERE id = ?3",
        params![prepare_finish_ms, transfer_start_ms, job_id],
    )
    .map_err(super::sqe)?;
    Ok(())
}

/// Closes the `transfer` phase — called once `job_status` reports
/// `running = 0 ∧ pending = 0` for every `(source_fs, target_fs)` pair in
/// the job.
pub fn close_transfer_phase(conn: &Connection, job_id: i64, transfer_finish_ms: i64) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE jobs SET transfer_finish = ?1 WHERE id = ?2",
        params![transfer_finish_ms, job_id],
    )
    .map_err(super::sqe)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseManager;

    #[test]
    fn lifecycle_transitions_persist() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let job_id = db.with_writer(|conn| insert_job(conn, "client-1", 3, 0)).unwrap();
        db.with_writer(|conn| open_transfer_phase(conn, job_id, 10, 10)).unwrap();
        db.with_writer(|conn| close_transfer_phase(conn, job_id, 20)).unwrap();

        let finish: Option<i64> = db
            .with_reader(|conn| {
                conn.query_row("SELECT transfer_finish FROM jobs WHERE id = ?1", [job_id], |row| row.get(0))
                    .map_err(super::super::sqe)
            })
            .unwrap();
        assert_eq!(finish, Some(20));
    }
}
