use std::collections::HashMap;

/// A registered storage endpoint. Identity is `name`, unique per job.
/// Immutable once created at job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filesystem {
    pub id: i64,
    pub name: String,
    pub driver_key: String,
    pub options: HashMap<String, String>,
    pub max_concurrency: u32,
}

impl Filesystem {
    /// `max_concurrency` must be at least 1; callers construct through
    /// config loading, which enforces this before a `Filesystem` exists.
    pub fn new(id: i64, name: impl Into<String>, driver_key: impl Into<String>, max_concurrency: u32) -> Self {
        Self {
            id,
            name: name.into(),
            driver_key: driver_key.into(),
            options: HashMap::new(),
            max_concurrency: max_concurrency.max(1),
        }
    }
}
