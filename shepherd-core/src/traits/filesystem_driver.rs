//! `FilesystemDriver` — the capability a storage backend implements so the
//! Planning Engine and dispatch loop can query and stat it without knowing
//! its concrete transport.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DriverError;

/// A targeting-query criterion, as parsed from the CLI's targeting-query
/// DSL. The DSL parser itself lives outside this crate; drivers only need
/// to recognize and reject predicates they can't satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicate {
    Root(String),
    Fofn(String),
    SizeGreaterThan(u64),
    SizeLessThan(u64),
    NameGlob(String),
    ModifiedAfter(i64),
    ModifiedBefore(i64),
}

/// A driver-reported candidate, pre-`DataItem` — the caller is responsible
/// for turning this into a persisted `DataItem` row.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItemStub {
    pub address: String,
    pub size: Option<u64>,
}

/// Attributes a driver can report for a single address. All fields are
/// optional because not every backend exposes every attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stat {
    pub size: Option<u64>,
    pub mtime: Option<i64>,
    pub ctime: Option<i64>,
    pub atime: Option<i64>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// The capability a concrete storage backend (POSIX, iRODS, S3, ...)
/// implements. Object-safe so it can be stored as `Arc<dyn FilesystemDriver>`
/// in the Filesystem Registry.
#[async_trait]
pub trait FilesystemDriver: Send + Sync {
    /// Enumerate addresses matching `criteria`. Returns
    /// `DriverError::UnsupportedPredicate` for any criterion this driver
    /// can't evaluate — callers must not silently drop it.
    async fn query(&self, criteria: &[QueryPredicate]) -> Result<Vec<DataItemStub>, DriverError>;

    /// Stat a single address. Any field the backend can't report is `None`,
    /// not an error.
    async fn stat(&self, address: &str) -> Result<Stat, DriverError>;

    /// The driver's own default concurrency cap, used when a
    /// [`crate::model::Filesystem`] doesn't specify one.
    fn max_concurrency_default(&self) -> u32;
}

#[async_trait]
impl<T: FilesystemDriver + ?Sized> FilesystemDriver for Arc<T> {
    async fn query(&self, criteria: &[QueryPredicate]) -> Result<Vec<DataItemStub>, DriverError> {
        (**self).query(criteria).await
    }

    async fn stat(&self, address: &str) -> Result<Stat, DriverError> {
        (**self).stat(address).await
    }

    fn max_concurrency_default(&self) -> u32 {
        (**self).max_concurrency_default()
    }
}
