//! Typed configuration for the shepherd YAML layout:
//! `filesystems`, `transfers`, `named_routes`, `executor`, `phase`,
//! `defaults`, merged last-file-wins across `--config` files.

mod executor_config;
mod filesystem_config;
mod route_config;
mod shepherd_config;

pub use executor_config::{ExecutorConfig, PhaseConfig};
pub use filesystem_config::FilesystemConfig;
pub use route_config::{NamedRouteConfig, NamedRouteHop, RouteConfig, TransformerConfig};
pub use shepherd_config::{ShepherdConfig, RESERVED_VARIABLES};
