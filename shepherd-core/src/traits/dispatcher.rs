//! `Dispatcher` — the capability that turns a rendered script into a
//! running (possibly remote) process and reports back its outcome.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DispatchError;

/// Resource request for one attempt, sourced from the `phase` config block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRequest {
    pub cores: Option<u32>,
    pub memory_mb: Option<u64>,
    pub group: Option<String>,
}

/// The outcome of one dispatched attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub exit_code: i32,
    pub started_at: i64,
    pub finished_at: i64,
}

/// The capability that executes a task's rendered `script` for one
/// attempt. Object-safe so the dispatch loop can hold `Arc<dyn Dispatcher>`
/// without committing to a concrete execution backend (local subprocess,
/// batch scheduler, ...).
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Submit `script` for `attempt_id` with the given resource request and
    /// await its outcome. A non-zero exit code is reported through
    /// `AttemptOutcome::exit_code`, not as an `Err` — only dispatch-level
    /// failures (the process could not even be started) are `Err`.
    async fn submit(
        &self,
        attempt_id: i64,
        script: &str,
        resources: &ResourceRequest,
    ) -> Result<AttemptOutcome, DispatchError>;
}

#[async_trait]
impl<T: Dispatcher + ?Sized> Dispatcher for Arc<T> {
    async fn submit(
        &self,
        attempt_id: i64,
        script: &str,
        resources: &ResourceRequest,
    ) -> Result<AttemptOutcome, DispatchError> {
        (**self).submit(attempt_id, script, resources).await
    }
}
