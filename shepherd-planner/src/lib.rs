//! # shepherd-planner
//!
//! The Planning Engine (spec components C1–C6): template rendering, the
//! filesystem and transformer registries, the transfer graph and its
//! minimax-path search, named-route resolution, and file expansion into
//! per-hop task chains. Pure logic over `shepherd-core` types — no I/O, no
//! SQL; persisting expanded chains is `shepherd-storage`'s job.

pub mod expand;
pub mod graph;
pub mod registry;
pub mod template;

pub use expand::{expand_file, expand_files, resolve_named_route, Environment, ExpandedChain, ExpandedTask, ResolvedHop};
pub use graph::{Route, TransferGraph};
pub use registry::{FilesystemRegistry, Transformer, TransformerRegistry};
pub use template::TemplateEngine;
