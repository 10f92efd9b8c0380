//! Deterministic text templating over a variable environment.

use std::collections::HashMap;

use serde::Serialize;
use shepherd_core::errors::PlanError;
use tera::{Context, Tera, Value};

/// The `source`/`target` context object exposed to a route's script
/// template — `{{ source.filesystem }}`, `{{ target.address }}`, etc.,
/// bound into `env ∪ {source: {filesystem, address}, target: {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct AddressContext {
    pub filesystem: String,
    pub address: String,
}

impl AddressContext {
    pub fn new(filesystem: impl Into<String>, address: impl Into<String>) -> Self {
        Self { filesystem: filesystem.into(), address: address.into() }
    }
}

/// POSIX shell-safe single-quote escaping: wraps the value in `'...'`,
/// replacing any embedded `'` with `'\''`.
fn sh_escape(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("sh_escape: value is not a string"))?;
    let escaped = format!("'{}'", s.replace('\'', r"'\''"));
    Ok(Value::String(escaped))
}

/// The parent-directory component of a path string, `/`-joined, matching
/// `std::path::Path::parent`. Returns `.` when the path has no parent.
fn dirname(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("dirname: value is not a string"))?;
    let parent = std::path::Path::new(s)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    Ok(Value::String(parent))
}

/// Renders text against a variable environment. Unresolved references fail
/// rather than substituting empty, matching `tera`'s default behavior for
/// an undefined context key.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.register_filter("sh_escape", sh_escape);
        tera.register_filter("dirname", dirname);
        Self { tera }
    }

    /// Register an additional named filter — used by callers that extend
    /// the built-in registry of named filters.
    pub fn register_filter<F>(&mut self, name: &str, filter: F)
    where
        F: tera::Filter + 'static,
    {
        self.tera.register_filter(name, filter);
    }

    /// `render(text, env) -> string`. `site` is used only to annotate a
    /// failure with where the template came from (a route name, a hop
    /// index, ...).
    pub fn render(&mut self, text: &str, env: &HashMap<String, String>, site: &str) -> Result<String, PlanError> {
        let mut context = Context::new();
        for (key, value) in env {
            context.insert(key, value);
        }
        self.tera
            .render_str(text, &context)
            .map_err(|e| PlanError::RenderError {
                site: site.to_string(),
                message: format_tera_error(&e),
            })
    }

    /// Like `render`, but additionally binds `source`/`target` as structured
    /// objects rather than flat strings — the shape a hop's script template
    /// renders against. `env` must not itself carry `source` or `target`
    /// keys; those names are reserved.
    pub fn render_script(
        &mut self,
        text: &str,
        env: &HashMap<String, String>,
        source: &AddressContext,
        target: &AddressContext,
        site: &str,
    ) -> Result<String, PlanError> {
        let mut context = Context::new();
        for (key, value) in env {
            context.insert(key, value);
        }
        context.insert("source", source);
        context.insert("target", target);
        self.tera
            .render_str(text, &context)
            .map_err(|e| PlanError::RenderError {
                site: site.to_string(),
                message: format_tera_error(&e),
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn format_tera_error(err: &tera::Error) -> String {
    let mut chain = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_variables() {
        let mut engine = TemplateEngine::new();
        let mut env = HashMap::new();
        env.insert("source".to_string(), "/data/in.bam".to_string());
        let out = engine.render("cp {{ source }} /out", &env, "test").unwrap();
        assert_eq!(out, "cp /data/in.bam /out");
    }

    #[test]
    fn unresolved_variable_fails() {
        let mut engine = TemplateEngine::new();
        let env = HashMap::new();
        let err = engine.render("cp {{ missing }} /out", &env, "test").unwrap_err();
        assert!(matches!(err, PlanError::RenderError { .. }));
    }

    #[test]
    fn sh_escape_quotes_embedded_single_quotes() {
        let mut engine = TemplateEngine::new();
        let mut env = HashMap::new();
        env.insert("path".to_string(), "it's/a/path".to_string());
        let out = engine.render("{{ path | sh_escape }}", &env, "test").unwrap();
        assert_eq!(out, r"'it'\''s/a/path'");
    }

    #[test]
    fn dirname_strips_last_component() {
        let mut engine = TemplateEngine::new();
        let mut env = HashMap::new();
        env.insert("path".to_string(), "/a/b/c.txt".to_string());
        let out = engine.render("{{ path | dirname }}", &env, "test").unwrap();
        assert_eq!(out, "/a/b");
    }

    #[test]
    fn render_script_exposes_source_and_target_attributes() {
        let mut engine = TemplateEngine::new();
        let env = HashMap::new();
        let source = AddressContext::new("scratch", "/data/in.bam");
        let target = AddressContext::new("archive", "/data/out.bam");
        let out = engine
            .render_script("cp {{ source.address }} {{ target.filesystem }}/{{ target.address }}", &env, &source, &target, "test")
            .unwrap();
        assert_eq!(out, "cp /data/in.bam archive//data/out.bam");
    }
}
