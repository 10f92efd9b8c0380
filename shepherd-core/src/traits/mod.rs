//! The two external-interface capabilities:
//! `FilesystemDriver` and `Dispatcher`. Concrete implementations are
//! external collaborators; `shepherd-fs-local` ships one reference pair.

mod dispatcher;
mod filesystem_driver;

pub use dispatcher::{AttemptOutcome, Dispatcher, ResourceRequest};
pub use filesystem_driver::{DataItemStub, FilesystemDriver, QueryPredicate, Stat};
