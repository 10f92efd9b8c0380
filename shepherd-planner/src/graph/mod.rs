//! Component C4: the Transfer Graph.

mod route;
mod transfer_graph;

pub use route::Route;
pub use transfer_graph::TransferGraph;
