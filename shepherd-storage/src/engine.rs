//! `ShepherdStorageEngine` — the crate's front door, bundling connection
//! management, job lifecycle, planner-chain persistence, and the dispatch
//! loop behind one handle.

use std::path::Path;
use std::sync::Arc;

use shepherd_core::errors::StorageError;
use shepherd_core::model::Checksum;
use shepherd_core::traits::Dispatcher;
use shepherd_planner::ExpandedChain;

use crate::batch::{persist_chain, PersistStats};
use crate::connection::DatabaseManager;
use crate::dispatch::DispatchLoop;
use crate::queries::{
    close_transfer_phase, filesystem_status_for_job, get_checksums, get_metadata,
    insert_filesystem, insert_job, job_status_for_job, job_throughput_for_job,
    open_transfer_phase, set_data_item_size, transfer_phase_is_drained, upsert_checksum,
    upsert_metadata, FilesystemStatusRow, JobStatusRow, JobThroughputRow,
};

pub struct ShepherdStorageEngine {
    db: Arc<DatabaseManager>,
}

impl ShepherdStorageEngine {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self { db: Arc::new(DatabaseManager::open(path)?) })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self { db: Arc::new(DatabaseManager::open_in_memory()?) })
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    pub fn register_filesystem(
        &self,
        name: &str,
        driver_key: &str,
        options: &str,
        max_concurrency: i64,
    ) -> Result<i64, StorageError> {
        self.db.with_writer(|conn| insert_filesystem(conn, name, driver_key, options, max_concurrency))
    }

    pub fn submit_job(&self, client_ref: &str, max_attempts: i64, now_ms: i64) -> Result<i64, StorageError> {
        self.db.with_writer(|conn| insert_job(conn, client_ref, max_attempts, now_ms))
    }

    /// Persists one file's expanded chain and returns how many tasks were
    /// inserted. Call once per source address during the job's `prepare`
    /// phase.
    pub fn persist_chain(&self, job_id: i64, chain: &ExpandedChain) -> Result<PersistStats, StorageError> {
        self.db.with_writer(|conn| persist_chain(conn, job_id, chain))
    }

    /// Closes `prepare` and opens `transfer` — call once all of a job's
    /// files have been expanded and persisted.
    pub fn open_transfer_phase(&self, job_id: i64, prepare_finish_ms: i64) -> Result<(), StorageError> {
        self.db.with_writer(|conn| open_transfer_phase(conn, job_id, prepare_finish_ms, prepare_finish_ms))
    }

    pub fn close_transfer_phase_if_drained(&self, job_id: i64, now_ms: i64) -> Result<bool, StorageError> {
        let drained = self.db.with_reader(|conn| transfer_phase_is_drained(conn, job_id))?;
        if drained {
            self.db.with_writer(|conn| close_transfer_phase(conn, job_id, now_ms))?;
        }
        Ok(drained)
    }

    pub fn job_status(&self, job_id: i64) -> Result<Vec<JobStatusRow>, StorageError> {
        self.db.with_reader(|conn| job_status_for_job(conn, job_id))
    }

    pub fn filesystem_status(&self, job_id: i64) -> Result<Vec<FilesystemStatusRow>, StorageError> {
        self.db.with_reader(|conn| filesystem_status_for_job(conn, job_id))
    }

    pub fn job_throughput(&self, job_id: i64) -> Result<Vec<JobThroughputRow>, StorageError> {
        self.db.with_reader(|conn| job_throughput_for_job(conn, job_id))
    }

    /// Records a `FilesystemDriver::stat()` result's size against a data
    /// item — a no-op if the item already has one: a DataItem is never
    /// mutated once a field is populated.
    pub fn record_size(&self, data_id: i64, size: i64) -> Result<(), StorageError> {
        self.db.with_writer(|conn| set_data_item_size(conn, data_id, size))
    }

    /// Records or replaces a checksum for `(data_id, algorithm)` — a
    /// re-checksum under an algorithm already on file is the new row for
    /// that key, not an additional one.
    pub fn record_checksum(&self, data_id: i64, algorithm: &str, value: &str) -> Result<(), StorageError> {
        self.db.with_writer(|conn| upsert_checksum(conn, data_id, algorithm, value))
    }

    pub fn record_metadata(&self, data_id: i64, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.with_writer(|conn| upsert_metadata(conn, data_id, key, value))
    }

    pub fn data_item_checksums(&self, data_id: i64) -> Result<Vec<Checksum>, StorageError> {
        self.db.with_reader(|conn| get_checksums(conn, data_id))
    }

    pub fn data_item_metadata(&self, data_id: i64) -> Result<Vec<(String, String)>, StorageError> {
        self.db.with_reader(|conn| get_metadata(conn, data_id))
    }

    /// Builds a dispatch loop bound to this engine's store and the given
    /// executor capability.
    pub fn dispatch_loop(&self, dispatcher: Arc<dyn Dispatcher>) -> DispatchLoop {
        DispatchLoop::new(Arc::clone(&self.db), dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_job_and_register_filesystem_roundtrip() {
        let engine = ShepherdStorageEngine::open_in_memory().unwrap();
        let fs_id = engine.register_filesystem("xyzzy", "local", "{}", 10).unwrap();
        let job_id = engine.submit_job("client-1", 3, 0).unwrap();
        assert!(fs_id > 0);
        assert!(job_id > 0);
    }

    #[test]
    fn drains_and_closes_phase_for_empty_job() {
        let engine = ShepherdStorageEngine::open_in_memory().unwrap();
        let job_id = engine.submit_job("client-1", 3, 0).unwrap();
        engine.open_transfer_phase(job_id, 0).unwrap();
        let drained = engine.close_transfer_phase_if_drained(job_id, 1).unwrap();
        assert!(drained);
    }
}
