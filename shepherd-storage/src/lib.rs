//! # shepherd-storage
//!
//! The State & Dispatch Engine (spec components C7–C8): the SQLite-backed
//! State Store, its derived views, and the Dispatch Loop that claims
//! `todo` rows and hands them to a `Dispatcher`.

pub mod batch;
pub mod connection;
pub mod dispatch;
pub mod engine;
pub mod migrations;
pub mod queries;

pub use connection::DatabaseManager;
pub use dispatch::DispatchLoop;
pub use engine::ShepherdStorageEngine;
