//! Component C1: the Template Engine.

mod engine;

pub use engine::{AddressContext, TemplateEngine};
