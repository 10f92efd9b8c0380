//! Per-table and per-view query functions.

mod attempts;
mod data_items;
mod filesystems;
mod jobs;
mod tasks;
mod views;

pub use attempts::{get_attempts_for_task, insert_attempt, record_completion, AttemptRecord};
pub use data_items::{
    get_checksums, get_metadata, get_or_create_data_item, set_data_item_size, upsert_checksum,
    upsert_metadata, DataItemRecord,
};
pub use filesystems::{get_filesystem_by_name, insert_filesystem, FilesystemRecord};
pub use jobs::{close_transfer_phase, insert_job, open_transfer_phase, JobRecord};
pub use tasks::{get_task, insert_task, TaskRecord};
pub use views::{
    filesystem_status_for_job, job_status_for_job, job_throughput_for_job,
    transfer_phase_is_drained, todo_for_job, FilesystemStatusRow, JobStatusRow,
    JobThroughputRow, TodoRow,
};

fn sqe(e: impl std::fmt::Display) -> shepherd_core::errors::StorageError {
    shepherd_core::errors::StorageError::SqliteError { message: e.to_string() }
}
