use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One entry of the `filesystems` config block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemConfig {
    pub name: String,
    pub driver: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
    pub max_concurrency: Option<u32>,
}

impl FilesystemConfig {
    /// Falls back to the driver's own default when unset.
    pub fn effective_max_concurrency(&self, driver_default: u32) -> u32 {
        self.max_concurrency.unwrap_or(driver_default).max(1)
    }
}
