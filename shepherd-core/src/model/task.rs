/// A single chained transfer step: move `source` to `target` on behalf of
/// `job_id`, running `script` once rendered. `dependency_task_id`, when
/// present, must have succeeded before this task is eligible; the
/// dependency graph across a job's tasks is a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub job_id: i64,
    pub source_data_id: i64,
    pub target_data_id: i64,
    pub script: String,
    pub dependency_task_id: Option<i64>,
}

/// The per-task state machine:
/// `New -> Running -> {Succeeded | FailedRetry -> Running | FailedTerminal}`.
/// Derived from a task's attempts, never stored directly — see the
/// `task_status` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    New,
    Running,
    Succeeded,
    FailedRetry,
    FailedTerminal,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::FailedRetry => "failed_retry",
            Self::FailedTerminal => "failed_terminal",
        }
    }

    /// Whether a task in this state can still appear in `todo`.
    pub fn is_eligible_for_retry(self) -> bool {
        matches!(self, Self::New | Self::FailedRetry)
    }
}
