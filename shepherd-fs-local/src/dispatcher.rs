//! `SubprocessDispatcher` — a reference `Dispatcher` that runs a task's
//! rendered script as a local shell subprocess.

use std::process::Stdio;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use shepherd_core::errors::DispatchError;
use shepherd_core::traits::{AttemptOutcome, Dispatcher, ResourceRequest};
use tokio::process::Command;

/// Runs scripts via `sh -c`, optionally under a wall-clock timeout — the
/// core imposes none itself, but a concrete executor may.
pub struct SubprocessDispatcher {
    timeout: Option<Duration>,
}

impl Default for SubprocessDispatcher {
    fn default() -> Self {
        Self { timeout: None }
    }
}

impl SubprocessDispatcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout: Some(timeout) }
    }
}

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_millis() as i64
}

#[async_trait]
impl Dispatcher for SubprocessDispatcher {
    async fn submit(
        &self,
        attempt_id: i64,
        script: &str,
        _resources: &ResourceRequest,
    ) -> Result<AttemptOutcome, DispatchError> {
        let started_at = now_ms();
        tracing::debug!(attempt_id, "submitting attempt to local subprocess dispatcher");

        let mut command = Command::new("sh");
        command.arg("-c").arg(script).stdout(Stdio::null()).stderr(Stdio::null());

        let spawn_and_wait = async {
            let mut child = command.spawn().map_err(|e| DispatchError::TransferFailure {
                attempt_id,
                exit_code: None,
                message: format!("failed to spawn script: {e}"),
            })?;
            child.wait().await.map_err(|e| DispatchError::TransferFailure {
                attempt_id,
                exit_code: None,
                message: format!("failed to wait on script: {e}"),
            })
        };

        let status = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, spawn_and_wait).await.map_err(|_| {
                DispatchError::TransferFailure {
                    attempt_id,
                    exit_code: None,
                    message: format!("script exceeded timeout of {timeout:?}"),
                }
            })??,
            None => spawn_and_wait.await?,
        };

        Ok(AttemptOutcome {
            exit_code: status.code().unwrap_or(-1),
            started_at,
            finished_at: now_ms(),
        })
    }
}
