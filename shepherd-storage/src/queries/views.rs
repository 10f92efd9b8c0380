//! Readers for the derived views.

use rusqlite::Connection;
use shepherd_core::errors::StorageError;

#[derive(Debug, Clone, PartialEq)]
pub struct TodoRow {
    pub task_id: i64,
    pub job_id: i64,
    pub size: Option<i64>,
    pub eta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusRow {
    pub job_id: i64,
    pub source_fs: String,
    pub target_fs: String,
    pub pending: i64,
    pub running: i64,
    pub failed: i64,
    pub succeeded: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobThroughputRow {
    pub job_id: i64,
    pub source_fs: String,
    pub target_fs: String,
    pub mean_bytes_per_sec: Option<f64>,
    pub mean_failure_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemStatusRow {
    pub job_id: i64,
    pub filesystem_id: i64,
    pub filesystem_name: String,
    pub max_concurrency: i64,
    pub concurrency: i64,
}

/// All eligible task ids for `job_id`, ordered `eta ascending, nulls
/// last, task.id ascending` — the `task.id` tie-break resolves ties and
/// nulls deterministically.
pub fn todo_for_job(conn: &Connection, job_id: i64) -> Result<Vec<TodoRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT task_id, job_id, size, eta FROM todo WHERE job_id = ?1
             ORDER BY (eta IS NULL), eta ASC, task_id ASC",
        )
        .map_err(super::sqe)?;
    let rows = stmt
        .query_map([job_id], |row| {
            Ok(TodoRow { task_id: row.get(0)?, job_id: row.get(1)?, size: row.get(2)?, eta: row.get(3)? })
        })
        .map_err(super::sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(super::sqe)
}

pub fn job_status_for_job(conn: &Connection, job_id: i64) -> Result<Vec<JobStatusRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT job_id, source_fs, target_fs, pending, running, failed, succeeded
             FROM job_status WHERE job_id = ?1",
        )
        .map_err(super::sqe)?;
    let rows = stmt
        .query_map([job_id], |row| {
            Ok(JobStatusRow {
                job_id: row.get(0)?,
                source_fs: row.get(1)?,
                target_fs: row.get(2)?,
                pending: row.get(3)?,
                running: row.get(4)?,
                failed: row.get(5)?,
                succeeded: row.get(6)?,
            })
        })
        .map_err(super::sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(super::sqe)
}

/// `true` once every `(source_fs, target_fs)` pair for the job has
/// `running = 0 ∧ pending = 0`, the job's termination condition.
/// A job with no tasks at all is vacuously finished.
pub fn transfer_phase_is_drained(conn: &Connection, job_id: i64) -> Result<bool, StorageError> {
    let rows = job_status_for_job(conn, job_id)?;
    Ok(rows.iter().all(|r| r.running == 0 && r.pending == 0))
}

/// Per `(source_fs, target_fs)`, mean throughput and failure rate over the
/// job's completed attempts — the basis for the `todo` view's `eta`
/// estimate, and independently useful for reporting.
pub fn job_throughput_for_job(conn: &Connection, job_id: i64) -> Result<Vec<JobThroughputRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT job_id, source_fs, target_fs, mean_bytes_per_sec, mean_failure_rate
             FROM job_throughput WHERE job_id = ?1",
        )
        .map_err(super::sqe)?;
    let rows = stmt
        .query_map([job_id], |row| {
            Ok(JobThroughputRow {
                job_id: row.get(0)?,
                source_fs: row.get(1)?,
                target_fs: row.get(2)?,
                mean_bytes_per_sec: row.get(3)?,
                mean_failure_rate: row.get(4)?,
            })
        })
        .map_err(super::sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(super::sqe)
}

pub fn filesystem_status_for_job(
    conn: &Connection,
    job_id: i64,
) -> Result<Vec<FilesystemStatusRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT job_id, filesystem_id, filesystem_name, max_concurrency, concurrency
             FROM filesystem_status WHERE job_id = ?1",
        )
        .map_err(super::sqe)?;
    let rows = stmt
        .query_map([job_id], |row| {
            Ok(FilesystemStatusRow {
                job_id: row.get(0)?,
                filesystem_id: row.get(1)?,
                filesystem_name: row.get(2)?,
                max_concurrency: row.get(3)?,
                concurrency: row.get(4)?,
            })
        })
        .map_err(super::sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(super::sqe)
}
