use shepherd_core::config::RouteConfig;

/// One edge of the Transfer Graph: `(name, source_fs, target_fs,
/// transformation_list, script_template, cost)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub source_fs: String,
    pub target_fs: String,
    pub transformers: Vec<String>,
    pub script_template: String,
    pub cost: u32,
}

impl Route {
    /// Builds a graph edge from its config row. `transformers` here is only
    /// the ordered kind names, carried for introspection (e.g. `shepherd
    /// plan --explain`); `bind_hops` builds the actual pipeline from the
    /// config's unrendered options, not from this list.
    pub fn from_config(config: &RouteConfig) -> Self {
        Self {
            name: config.name.clone(),
            source_fs: config.source.clone(),
            target_fs: config.target.clone(),
            transformers: config.transformers.iter().map(|t| t.kind.clone()).collect(),
            script_template: config.script.clone(),
            cost: config.cost,
        }
    }
}
