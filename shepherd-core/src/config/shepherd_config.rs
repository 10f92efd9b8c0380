use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

use super::executor_config::{ExecutorConfig, PhaseConfig};
use super::filesystem_config::FilesystemConfig;
use super::route_config::{NamedRouteConfig, RouteConfig};

/// Variable names the template environment never accepts from config or
/// CLI input — they're always supplied by the Task Expander itself.
pub const RESERVED_VARIABLES: &[&str] = &["source", "target"];

/// The full top-level shape of a shepherd config file: top-level
/// keys `filesystems`, `transfers`, `named_routes`, `executor`, `phase`,
/// `defaults`, merged last-file-wins across `--config` files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShepherdConfig {
    pub filesystems: Vec<FilesystemConfig>,
    pub transfers: Vec<RouteConfig>,
    pub named_routes: Vec<NamedRouteConfig>,
    pub executor: ExecutorConfig,
    pub phase: PhaseConfig,
    pub defaults: HashMap<String, String>,
}

impl ShepherdConfig {
    /// Parse one YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load and parse a single config file from disk.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load a list of config files in order and merge them last-file-wins,
    /// then validate the result. `--config a.yaml --config b.yaml` means
    /// `b.yaml`'s `defaults`/`executor`/`phase` scalars win where both set
    /// them, while `filesystems`/`transfers`/`named_routes` accumulate.
    pub fn load_merged(paths: &[impl AsRef<Path>]) -> Result<Self, ConfigError> {
        let mut merged = ShepherdConfig::default();
        for path in paths {
            let next = Self::load_file(path.as_ref())?;
            merged = merged.merge(next);
        }
        merged.validate()?;
        Ok(merged)
    }

    /// Merge `other` on top of `self`: `other` wins for scalar fields,
    /// lists are concatenated (duplicate detection happens in `validate`).
    pub fn merge(mut self, other: ShepherdConfig) -> Self {
        self.filesystems.extend(other.filesystems);
        self.transfers.extend(other.transfers);
        self.named_routes.extend(other.named_routes);
        if other.executor.kind.is_some() {
            self.executor.kind = other.executor.kind;
        }
        if other.executor.max_inflight.is_some() {
            self.executor.max_inflight = other.executor.max_inflight;
        }
        if other.phase.cores.is_some() {
            self.phase.cores = other.phase.cores;
        }
        if other.phase.memory_mb.is_some() {
            self.phase.memory_mb = other.phase.memory_mb;
        }
        if other.phase.group.is_some() {
            self.phase.group = other.phase.group;
        }
        for (k, v) in other.defaults {
            self.defaults.insert(k, v);
        }
        self
    }

    /// Overlay `SHEPHERD_*` environment variables onto `defaults`, lowest
    /// precedence of the four-layer environment stack (CLI `-v` > env >
    /// `--variables` files > config `defaults`) — so callers apply this
    /// before the other layers, never after.
    pub fn apply_env_prefix(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        const PREFIX: &str = "SHEPHERD_";
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(PREFIX) {
                self.defaults.insert(name.to_lowercase(), value);
            }
        }
    }

    /// Validate name-uniqueness and driver/reserved-name constraints that
    /// don't require the full Transfer Graph to check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_fs = std::collections::HashSet::new();
        for fs in &self.filesystems {
            if !seen_fs.insert(fs.name.as_str()) {
                return Err(ConfigError::DuplicateFilesystem(fs.name.clone()));
            }
        }

        let mut seen_routes = std::collections::HashSet::new();
        for route in &self.transfers {
            if !seen_routes.insert(route.name.as_str()) {
                return Err(ConfigError::DuplicateRoute(route.name.clone()));
            }
        }

        let mut seen_named = std::collections::HashSet::new();
        for named in &self.named_routes {
            if !seen_named.insert(named.name.as_str()) {
                return Err(ConfigError::DuplicateNamedRoute(named.name.clone()));
            }
        }

        for key in self.defaults.keys() {
            if RESERVED_VARIABLES.contains(&key.as_str()) {
                return Err(ConfigError::ReservedVariable {
                    name: key.clone(),
                    source: "defaults".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_config(name: &str) -> FilesystemConfig {
        FilesystemConfig {
            name: name.to_string(),
            driver: "local".to_string(),
            options: HashMap::new(),
            max_concurrency: None,
        }
    }

    #[test]
    fn merge_is_last_file_wins_for_scalars() {
        let mut a = ShepherdConfig::default();
        a.executor.max_inflight = Some(4);
        a.defaults.insert("region".to_string(), "us".to_string());

        let mut b = ShepherdConfig::default();
        b.executor.max_inflight = Some(8);
        b.defaults.insert("region".to_string(), "eu".to_string());

        let merged = a.merge(b);
        assert_eq!(merged.executor.max_inflight, Some(8));
        assert_eq!(merged.defaults.get("region").map(String::as_str), Some("eu"));
    }

    #[test]
    fn merge_accumulates_filesystem_lists() {
        let mut a = ShepherdConfig::default();
        a.filesystems.push(fs_config("alpha"));

        let mut b = ShepherdConfig::default();
        b.filesystems.push(fs_config("beta"));

        let merged = a.merge(b);
        assert_eq!(merged.filesystems.len(), 2);
    }

    #[test]
    fn duplicate_filesystem_name_is_rejected() {
        let mut cfg = ShepherdConfig::default();
        cfg.filesystems.push(fs_config("alpha"));
        cfg.filesystems.push(fs_config("alpha"));

        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFilesystem(name) if name == "alpha"));
    }

    #[test]
    fn reserved_variable_in_defaults_is_rejected() {
        let mut cfg = ShepherdConfig::default();
        cfg.defaults.insert("source".to_string(), "oops".to_string());

        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ReservedVariable { name, .. } if name == "source"));
    }

    #[test]
    fn apply_env_prefix_strips_and_lowercases() {
        let mut cfg = ShepherdConfig::default();
        cfg.apply_env_prefix([("SHEPHERD_REGION".to_string(), "eu".to_string())]);
        assert_eq!(cfg.defaults.get("region").map(String::as_str), Some("eu"));
    }

    #[test]
    fn from_yaml_str_parses_full_layout() {
        let yaml = r#"
filesystems:
  - name: scratch
    driver: local
transfers:
  - name: scratch-to-archive
    source: scratch
    target: archive
    script: "cp {{ source }} {{ target }}"
defaults:
  owner: alice
"#;
        let cfg = ShepherdConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.filesystems.len(), 1);
        assert_eq!(cfg.transfers[0].cost, 1);
        assert_eq!(cfg.defaults.get("owner").map(String::as_str), Some("alice"));
    }
}
