//! Filesystem-driver errors, chiefly `UnsupportedPredicate`.

use super::error_code::{self, ShepherdErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("driver '{driver}' does not support predicate: {predicate}")]
    UnsupportedPredicate { driver: String, predicate: String },

    #[error("driver I/O error on '{address}': {message}")]
    Io { address: String, message: String },
}

impl ShepherdErrorCode for DriverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedPredicate { .. } => error_code::DRIVER_UNSUPPORTED_PREDICATE,
            Self::Io { .. } => error_code::DRIVER_IO_ERROR,
        }
    }
}
