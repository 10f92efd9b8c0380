//! The shepherd data model: `Filesystem`, `DataItem`, `Job`, `Task`,
//! `Attempt`, and the state machines derived from them. These are plain
//! value types; persistence lives in `shepherd-storage`.

mod attempt;
mod data_item;
mod filesystem;
mod job;
mod task;

pub use attempt::Attempt;
pub use data_item::{Checksum, DataItem};
pub use filesystem::Filesystem;
pub use job::{Job, Phase, PhaseTiming};
pub use task::{Task, TaskState};
