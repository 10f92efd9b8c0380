//! Persists a planner-produced `ExpandedChain` as `DataItem`/`Task` rows.
//!
//! One transaction per unit of work, rolled back whole on any failure. Here
//! the unit of work is a single file's chain — task insertion for one file
//! is atomic, all-or-none — not a buffered batch across many files: each
//! file's chain stands alone, so a dedicated writer thread and channel
//! would add queuing machinery the contract doesn't ask for.

use rusqlite::Connection;
use shepherd_core::errors::StorageError;
use shepherd_planner::ExpandedChain;

use crate::queries::{get_or_create_data_item, get_filesystem_by_name, insert_task};

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistStats {
    pub tasks_inserted: usize,
}

/// Resolves filesystem names to ids, gets-or-creates the source/target
/// `DataItem` of every hop, and inserts the chain's tasks with
/// `dependency_task_id` linking each hop to the one before it — all
/// inside a single transaction.
pub fn persist_chain(conn: &Connection, job_id: i64, chain: &ExpandedChain) -> Result<PersistStats, StorageError> {
    // `unchecked_transaction` (vs. `Connection::transaction`, which needs
    // `&mut Connection`) fits the `DatabaseManager::with_writer` callback
    // shape, which only ever hands out a shared reference.
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut previous_task_id: Option<i64> = None;
    let mut tasks_inserted = 0;

    for task in &chain.tasks {
        let source_fs = get_filesystem_by_name(&tx, &task.source_fs)?
            .ok_or_else(|| StorageError::InvariantViolation(format!("unknown filesystem '{}'", task.source_fs)))?;
        let target_fs = get_filesystem_by_name(&tx, &task.target_fs)?
            .ok_or_else(|| StorageError::InvariantViolation(format!("unknown filesystem '{}'", task.target_fs)))?;

        let source_item = get_or_create_data_item(&tx, source_fs.id, &task.source_addr)?;
        let target_item = get_or_create_data_item(&tx, target_fs.id, &task.target_addr)?;

        let task_id = insert_task(&tx, job_id, source_item.id, target_item.id, &task.script, previous_task_id)?;
        previous_task_id = Some(task_id);
        tasks_inserted += 1;
    }

    tx.commit().map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(PersistStats { tasks_inserted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseManager;
    use crate::queries::insert_filesystem;
    use crate::queries::insert_job;
    use shepherd_planner::ExpandedTask;

    fn chain_of(n: usize) -> ExpandedChain {
        ExpandedChain {
            tasks: (0..n)
                .map(|i| ExpandedTask {
                    source_fs: if i == 0 { "a".to_string() } else { "b".to_string() },
                    source_addr: format!("/hop{i}/src"),
                    target_fs: "b".to_string(),
                    target_addr: format!("/hop{i}/dst"),
                    script: format!("cp /hop{i}/src /hop{i}/dst"),
                })
                .collect(),
        }
    }

    #[test]
    fn persists_chain_as_dependent_task_sequence() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let job_id = db
            .with_writer(|conn| {
                insert_filesystem(conn, "a", "local", "{}", 10)?;
                insert_filesystem(conn, "b", "local", "{}", 10)?;
                insert_job(conn, "client-1", 3, 0)
            })
            .unwrap();

        let chain = chain_of(2);
        let stats = db
            .with_writer(|conn| persist_chain(conn, job_id, &chain))
            .unwrap();
        assert_eq!(stats.tasks_inserted, 2);

        let count: i64 = db
            .with_reader(|conn| {
                conn.query_row("SELECT COUNT(*) FROM tasks WHERE job_id = ?1", [job_id], |row| row.get(0))
                    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn unknown_filesystem_rolls_back_whole_chain() {
        let db = DatabaseManager::open_in_memory().unwrap();
        let job_id = db.with_writer(|conn| insert_job(conn, "client-1", 3, 0)).unwrap();

        let chain = chain_of(1);
        let err = db.with_writer(|conn| persist_chain(conn, job_id, &chain)).unwrap_err();
        assert!(matches!(err, StorageError::InvariantViolation(_)));

        let count: i64 = db
            .with_reader(|conn| {
                conn.query_row("SELECT COUNT(*) FROM tasks WHERE job_id = ?1", [job_id], |row| row.get(0))
                    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
