use serde::{Deserialize, Serialize};

/// The `executor` config block — which `Dispatcher` implementation to use
/// and how many attempts it may run concurrently in this process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ExecutorConfig {
    pub kind: Option<String>,
    pub max_inflight: Option<u32>,
}

impl ExecutorConfig {
    pub fn effective_max_inflight(&self) -> u32 {
        self.max_inflight.unwrap_or(16)
    }
}

/// The `phase` config block — the default resource request handed to
/// `Dispatcher::submit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PhaseConfig {
    pub cores: Option<u32>,
    pub memory_mb: Option<u64>,
    pub group: Option<String>,
}
