//! `tasks` table queries. Task rows are never mutated after insertion
//! — only attempts change over a task's lifetime.

use rusqlite::{params, Connection};
use shepherd_core::errors::StorageError;

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: i64,
    pub job_id: i64,
    pub source_data_id: i64,
    pub target_data_id: i64,
    pub script: String,
    pub dependency_task_id: Option<i64>,
}

pub fn get_task(conn: &Connection, task_id: i64) -> Result<TaskRecord, StorageError> {
    conn.query_row(
        "SELECT id, job_id, source_data_id, target_data_id, script, dependency_task_id
         FROM tasks WHERE id = ?1",
        [task_id],
        |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                job_id: row.get(1)?,
                source_data_id: row.get(2)?,
                target_data_id: row.get(3)?,
                script: row.get(4)?,
                dependency_task_id: row.get(5)?,
            })
        },
    )
    .map_err(super::sqe)
}

pub fn insert_task(
    conn: &Connection,
    job_id: i64,
    source_data_id: i64,
    target_data_id: i64,
    script: &str,
    dependency_task_id: Option<i64>,
) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO tasks (job_id, source_data_id, target_data_id, script, dependency_task_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![job_id, source_data_id, target_data_id, script, dependency_task_id],
    )
    .map_err(super::sqe)?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseManager;
    use crate::queries::{get_or_create_data_item, insert_filesystem, insert_job};

    #[test]
    fn duplicate_target_within_job_is_rejected() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let err = db
            .with_writer(|conn| {
                let fs_id = insert_filesystem(conn, "xyzzy", "local", "{}", 10)?;
                let job_id = insert_job(conn, "client-1", 3, 0)?;
                let foo = get_or_create_data_item(conn, fs_id, "foo")?;
                let bar = get_or_create_data_item(conn, fs_id, "bar")?;
                let quux = get_or_create_data_item(conn, fs_id, "quux")?;
                insert_task(conn, job_id, foo.id, bar.id, "abc123", None)?;
                insert_task(conn, job_id, quux.id, bar.id, "dup-target", None)
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::SqliteError { .. }));
    }

    #[test]
    fn same_source_and_target_is_rejected() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let err = db
            .with_writer(|conn| {
                let fs_id = insert_filesystem(conn, "xyzzy", "local", "{}", 10)?;
                let job_id = insert_job(conn, "client-1", 3, 0)?;
                let foo = get_or_create_data_item(conn, fs_id, "foo")?;
                insert_task(conn, job_id, foo.id, foo.id, "abc123", None)
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::SqliteError { .. }));
    }
}
