//! Component C3: the Transformer Registry and its built-in transformers.

use std::collections::HashMap;
use std::sync::Arc;

use shepherd_core::errors::PlanError;

/// A pure address-rewriter applied to a `(source, target)` pair mid-pipeline.
/// Must not perform I/O — options are template-rendered once at
/// route-resolution time and frozen before a `Transformer` ever runs.
pub trait Transformer: Send + Sync {
    fn apply(&self, source_addr: &str, target_addr: &str, env: &HashMap<String, String>) -> (String, String);
}

/// Prefixes the target address with a fixed path component.
pub struct Prefix {
    pub path: String,
}

impl Transformer for Prefix {
    fn apply(&self, source_addr: &str, target_addr: &str, _env: &HashMap<String, String>) -> (String, String) {
        let joined = format!("{}/{}", self.path.trim_end_matches('/'), target_addr.trim_start_matches('/'));
        (source_addr.to_string(), joined)
    }
}

/// Strips whatever path prefix `source_addr` and `target_addr` have in
/// common, component-wise, from the target address.
pub struct StripCommonPath;

impl Transformer for StripCommonPath {
    fn apply(&self, source_addr: &str, target_addr: &str, _env: &HashMap<String, String>) -> (String, String) {
        let source_parts: Vec<&str> = source_addr.split('/').collect();
        let target_parts: Vec<&str> = target_addr.split('/').collect();
        let common = source_parts
            .iter()
            .zip(target_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let remainder = target_parts[common..].join("/");
        (source_addr.to_string(), remainder)
    }
}

/// Keeps only the last `n` path components of the target address.
pub struct LastNComponents {
    pub n: usize,
}

impl Transformer for LastNComponents {
    fn apply(&self, source_addr: &str, target_addr: &str, _env: &HashMap<String, String>) -> (String, String) {
        let parts: Vec<&str> = target_addr.split('/').filter(|s| !s.is_empty()).collect();
        let start = parts.len().saturating_sub(self.n);
        (source_addr.to_string(), parts[start..].join("/"))
    }
}

/// Forwards `(source, target)` unchanged. Used to hang debug/telemetry
/// side effects (e.g. `tracing::debug!`) off a pipeline stage without
/// altering addresses.
pub struct Passthrough {
    pub label: String,
}

impl Transformer for Passthrough {
    fn apply(&self, source_addr: &str, target_addr: &str, _env: &HashMap<String, String>) -> (String, String) {
        tracing::debug!(label = %self.label, source = source_addr, target = target_addr, "transformer passthrough");
        (source_addr.to_string(), target_addr.to_string())
    }
}

/// Builds a built-in transformer from its config `kind` and already
/// rendered options — options are templated at route-resolution time then
/// frozen, so rendering happens before this is called.
pub fn build_builtin(kind: &str, options: &[String]) -> Result<Arc<dyn Transformer>, PlanError> {
    match kind {
        "prefix" => {
            let path = options
                .first()
                .ok_or_else(|| PlanError::UnknownTransformer("prefix: missing path option".to_string()))?;
            Ok(Arc::new(Prefix { path: path.clone() }))
        }
        "strip_common_path" => Ok(Arc::new(StripCommonPath)),
        "last_n_components" => {
            let n: usize = options
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| PlanError::UnknownTransformer("last_n_components: missing/invalid n option".to_string()))?;
            Ok(Arc::new(LastNComponents { n }))
        }
        "debug" | "telemetry" => Ok(Arc::new(Passthrough { label: kind.to_string() })),
        other => Err(PlanError::UnknownTransformer(other.to_string())),
    }
}

/// Named lookup from transformer name to implementation, built once at
/// config-load time — the same "registry keyed by name" shape as the
/// Filesystem Registry.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: HashMap<String, Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    /// A registry pre-populated with the built-in transformers.
    /// `prefix` and `last_n_components` need per-use parameters that only
    /// `build_builtin` can supply from rendered config options; the
    /// instances registered here are identity-ish defaults (empty prefix,
    /// unbounded component count) so `get()` still resolves the name.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.register("prefix", Arc::new(Prefix { path: String::new() }));
        registry.register("strip_common_path", Arc::new(StripCommonPath));
        registry.register("last_n_components", Arc::new(LastNComponents { n: usize::MAX }));
        registry.register("debug", Arc::new(Passthrough { label: "debug".to_string() }));
        registry.register("telemetry", Arc::new(Passthrough { label: "telemetry".to_string() }));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, transformer: Arc<dyn Transformer>) {
        self.transformers.insert(name.into(), transformer);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Transformer>, PlanError> {
        self.transformers
            .get(name)
            .cloned()
            .ok_or_else(|| PlanError::UnknownTransformer(name.to_string()))
    }

    /// Run `source_addr`/`target_addr` through a pipeline of transformer
    /// invocations in strict left-to-right order.
    pub fn apply_pipeline(
        &self,
        names: &[String],
        mut source_addr: String,
        mut target_addr: String,
        env: &HashMap<String, String>,
    ) -> Result<(String, String), PlanError> {
        for name in names {
            let transformer = self.get(name)?;
            let (next_source, next_target) = transformer.apply(&source_addr, &target_addr, env);
            source_addr = next_source;
            target_addr = next_target;
        }
        Ok((source_addr, target_addr))
    }
}
