//! `attempts` table queries — the insert (claim) and completion-recording
//! halves of the Dispatch Loop.

use rusqlite::{params, Connection};
use shepherd_core::errors::StorageError;

#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub id: i64,
    pub task_id: i64,
    pub start: i64,
    pub finish: Option<i64>,
    pub exit_code: Option<i32>,
}

/// Inserts an inflight attempt for `task_id`. This is the claim step's
/// commit point: it is what removes the task from `todo` and reserves a
/// concurrency unit against both of the task's filesystems.
pub fn insert_attempt(conn: &Connection, task_id: i64, start_ms: i64) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO attempts (task_id, start, finish, exit_code) VALUES (?1, ?2, NULL, NULL)",
        params![task_id, start_ms],
    )
    .map_err(super::sqe)?;
    Ok(conn.last_insert_rowid())
}

/// Records the completion of an inflight attempt.
pub fn record_completion(
    conn: &Connection,
    attempt_id: i64,
    finish_ms: i64,
    exit_code: i32,
) -> Result<(), StorageError> {
    let updated = conn
        .execute(
            "UPDATE attempts SET finish = ?1, exit_code = ?2 WHERE id = ?3",
            params![finish_ms, exit_code, attempt_id],
        )
        .map_err(super::sqe)?;
    if updated == 0 {
        return Err(StorageError::InvariantViolation(format!("no attempt with id {attempt_id}")));
    }
    Ok(())
}

/// All attempts for a task, oldest first — totally ordered by `start`.
pub fn get_attempts_for_task(conn: &Connection, task_id: i64) -> Result<Vec<AttemptRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT id, task_id, start, finish, exit_code FROM attempts WHERE task_id = ?1 ORDER BY start")
        .map_err(super::sqe)?;
    let rows = stmt
        .query_map([task_id], |row| {
            Ok(AttemptRecord {
                id: row.get(0)?,
                task_id: row.get(1)?,
                start: row.get(2)?,
                finish: row.get(3)?,
                exit_code: row.get(4)?,
            })
        })
        .map_err(super::sqe)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(super::sqe)
}
