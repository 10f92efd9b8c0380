//! Storage-layer errors for the State Store: `SchemaMismatch`,
//! `TransientStoreError`, and the rest.

use super::error_code::{self, ShepherdErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("schema mismatch: store is at version {found}, this build expects {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("store busy, retry: {message}")]
    Transient { message: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ShepherdErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_SQLITE_ERROR,
            Self::SchemaMismatch { .. } => error_code::STORAGE_SCHEMA_MISMATCH,
            Self::Transient { .. } => error_code::STORAGE_TRANSIENT,
            Self::InvariantViolation(_) => error_code::STORAGE_INVARIANT_VIOLATION,
        }
    }
}
