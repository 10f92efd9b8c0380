//! # shepherd-fs-local
//!
//! Reference implementations of the two external-interface capabilities
//! over the local machine: a `FilesystemDriver` that walks
//! and stats the POSIX filesystem, and a `Dispatcher` that runs rendered
//! scripts as local shell subprocesses.

mod dispatcher;
mod filesystem_driver;

pub use dispatcher::SubprocessDispatcher;
pub use filesystem_driver::LocalFilesystemDriver;
