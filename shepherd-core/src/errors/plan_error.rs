//! Planning-engine errors: `UnresolvedVariable`, `NoRoute`,
//! `InvalidNamedRoute`.

use super::error_code::{self, ShepherdErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("no route from '{from}' to '{to}'")]
    NoRoute { from: String, to: String },

    #[error("named route '{name}' is invalid: hop {hop} target '{target}' does not match hop {next_hop} source '{next_source}'")]
    InvalidNamedRoute {
        name: String,
        hop: usize,
        target: String,
        next_hop: usize,
        next_source: String,
    },

    #[error("unresolved variable '{variable}' referenced at {site}")]
    UnresolvedVariable { variable: String, site: String },

    #[error("'{name}' is a reserved variable name and cannot appear in {site}")]
    ReservedVariable { name: String, site: String },

    #[error("duplicate transfer route name: {0}")]
    DuplicateRoute(String),

    #[error("unknown transformer: {0}")]
    UnknownTransformer(String),

    #[error("named route '{name}' references unknown route '{route}' at hop {hop}")]
    UnknownRoute { name: String, route: String, hop: usize },

    #[error("template render error at {site}: {message}")]
    RenderError { site: String, message: String },
}

impl ShepherdErrorCode for PlanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoRoute { .. } => error_code::PLAN_NO_ROUTE,
            Self::InvalidNamedRoute { .. } | Self::UnknownRoute { .. } => {
                error_code::PLAN_INVALID_NAMED_ROUTE
            }
            Self::UnresolvedVariable { .. } => error_code::PLAN_UNRESOLVED_VARIABLE,
            Self::ReservedVariable { .. } => error_code::PLAN_RESERVED_VARIABLE,
            Self::DuplicateRoute(_) => error_code::PLAN_DUPLICATE_ROUTE,
            Self::UnknownTransformer(_) => error_code::PLAN_UNKNOWN_TRANSFORMER,
            Self::RenderError { .. } => error_code::PLAN_UNRESOLVED_VARIABLE,
        }
    }
}
