//! Configuration-load errors.

use super::error_code::{self, ShepherdErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate filesystem name: {0}")]
    DuplicateFilesystem(String),

    #[error("duplicate route name: {0}")]
    DuplicateRoute(String),

    #[error("duplicate named route: {0}")]
    DuplicateNamedRoute(String),

    #[error("unknown driver key: {0}")]
    UnknownDriver(String),

    #[error("'{name}' is a reserved variable name and cannot be injected from {source}")]
    ReservedVariable { name: String, source: String },

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("failed to read config file {path}: {message}")]
    IoError { path: String, message: String },
}

impl ShepherdErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateFilesystem(_) | Self::DuplicateRoute(_) | Self::DuplicateNamedRoute(_) => {
                error_code::CONFIG_DUPLICATE_NAME
            }
            Self::UnknownDriver(_) => error_code::CONFIG_UNKNOWN_DRIVER,
            Self::ReservedVariable { .. } => error_code::CONFIG_RESERVED_VARIABLE,
            Self::ParseError { .. } => error_code::CONFIG_PARSE_ERROR,
            Self::IoError { .. } => error_code::CONFIG_IO_ERROR,
        }
    }
}
