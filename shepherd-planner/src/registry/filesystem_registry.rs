//! Component C2: the Filesystem Registry.

use std::collections::HashMap;
use std::sync::Arc;

use shepherd_core::config::FilesystemConfig;
use shepherd_core::errors::ConfigError;
use shepherd_core::{Filesystem, FilesystemDriver};

/// One registered filesystem: its model row plus the driver handle that
/// backs it. Built once at config-load time, immutable thereafter.
struct Entry {
    filesystem: Filesystem,
    driver: Arc<dyn FilesystemDriver>,
}

/// Named lookup from filesystem name to its model and driver. Duplicate
/// names are rejected at registration, matching `add_route`'s rejection in
/// the Transfer Graph.
#[derive(Default)]
pub struct FilesystemRegistry {
    entries: HashMap<String, Entry>,
}

impl FilesystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filesystem under `filesystem.name`, with a positive
    /// `max_concurrency` already resolved by the caller (falling back to
    /// `driver.max_concurrency_default()` when config left it unset).
    pub fn register(&mut self, filesystem: Filesystem, driver: Arc<dyn FilesystemDriver>) -> Result<(), ConfigError> {
        if self.entries.contains_key(&filesystem.name) {
            return Err(ConfigError::DuplicateFilesystem(filesystem.name));
        }
        let name = filesystem.name.clone();
        self.entries.insert(name, Entry { filesystem, driver });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<(&Filesystem, &Arc<dyn FilesystemDriver>)> {
        self.entries.get(name).map(|e| (&e.filesystem, &e.driver))
    }

    pub fn driver(&self, name: &str) -> Option<&Arc<dyn FilesystemDriver>> {
        self.entries.get(name).map(|e| &e.driver)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a registry from the `filesystems` config block. `drivers` maps
    /// each config row's `driver` kind (e.g. `"local"`, `"irods"`) to the
    /// already-constructed `FilesystemDriver` for that kind — concrete driver
    /// construction is the embedding application's job, not the Planning
    /// Engine's. Rows are assigned ids in file order, starting at 1.
    pub fn from_configs(
        configs: &[FilesystemConfig],
        drivers: &HashMap<String, Arc<dyn FilesystemDriver>>,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for (index, config) in configs.iter().enumerate() {
            let driver = drivers
                .get(&config.driver)
                .ok_or_else(|| ConfigError::UnknownDriver(config.driver.clone()))?;
            let max_concurrency = config.effective_max_concurrency(driver.max_concurrency_default());
            let filesystem = Filesystem {
                options: config.options.clone(),
                ..Filesystem::new(index as i64 + 1, config.name.clone(), config.driver.clone(), max_concurrency)
            };
            registry.register(filesystem, driver.clone())?;
        }
        Ok(registry)
    }
}
