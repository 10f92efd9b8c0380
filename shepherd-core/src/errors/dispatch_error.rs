//! Dispatch-time errors: `TransferFailure`, `TerminalFailure`.
//!
//! Neither variant is raised by the State Store itself — a `Dispatcher`
//! reports them for a single attempt, and the dispatch loop decides whether
//! the task still has attempts left (§4.9's `FAILED_RETRY`) or not
//! (`FAILED_TERMINAL`); the enum only names the two outcomes.

use super::error_code::{self, ShepherdErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("attempt {attempt_id} failed (exit code {exit_code:?}): {message}")]
    TransferFailure {
        attempt_id: i64,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("task {task_id} exhausted its attempts after attempt {attempt_id}")]
    TerminalFailure { task_id: i64, attempt_id: i64 },
}

impl ShepherdErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TransferFailure { .. } => error_code::DISPATCH_TRANSFER_FAILURE,
            Self::TerminalFailure { .. } => error_code::DISPATCH_TERMINAL_FAILURE,
        }
    }
}
