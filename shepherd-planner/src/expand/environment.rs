use std::collections::HashMap;

use shepherd_core::config::RESERVED_VARIABLES;
use shepherd_core::errors::PlanError;

/// The four-layer variable environment: CLI `-v` overrides,
/// `SHEPHERD_*` environment variables, `--variables` files, then config
/// `defaults` — ordered highest-precedence-first.
pub struct Environment {
    layers: Vec<HashMap<String, String>>,
}

impl Environment {
    /// `layers[0]` is the highest-precedence layer (typically CLI `-v`);
    /// later layers are progressively lower precedence.
    pub fn new(layers: Vec<HashMap<String, String>>) -> Self {
        Self { layers }
    }

    /// Merges all layers into a single map, lowest precedence first so a
    /// higher-precedence layer overwrites.
    pub fn resolve(&self) -> HashMap<String, String> {
        let mut merged = HashMap::new();
        for layer in self.layers.iter().rev() {
            for (k, v) in layer {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    /// Validates that no layer injects a reserved name (`source`/`target`),
    /// citing the offending layer index as `site`.
    pub fn reject_reserved(&self) -> Result<(), PlanError> {
        for (index, layer) in self.layers.iter().enumerate() {
            for key in layer.keys() {
                if RESERVED_VARIABLES.contains(&key.as_str()) {
                    return Err(PlanError::ReservedVariable {
                        name: key.clone(),
                        site: format!("environment layer {index}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_precedence_layer_wins() {
        let mut cli = HashMap::new();
        cli.insert("owner".to_string(), "cli-value".to_string());
        let mut defaults = HashMap::new();
        defaults.insert("owner".to_string(), "config-value".to_string());

        let env = Environment::new(vec![cli, HashMap::new(), HashMap::new(), defaults]);
        let resolved = env.resolve();
        assert_eq!(resolved.get("owner").map(String::as_str), Some("cli-value"));
    }

    #[test]
    fn reserved_variable_in_any_layer_is_rejected() {
        let mut cli = HashMap::new();
        cli.insert("source".to_string(), "nope".to_string());
        let env = Environment::new(vec![cli]);
        let err = env.reject_reserved().unwrap_err();
        assert!(matches!(err, PlanError::ReservedVariable { name, .. } if name == "source"));
    }
}
