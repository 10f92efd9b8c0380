use serde::{Deserialize, Serialize};

/// One transformer invocation in a route's pipeline — `kind` names a
/// registered transformer, `options` are its unrendered template strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformerConfig {
    pub kind: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// One entry of the `transfers` config block — a single edge of the
/// Transfer Graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
    pub script: String,
    #[serde(default = "default_cost")]
    pub cost: u32,
}

fn default_cost() -> u32 {
    1
}

/// One hop of a `named_routes` entry — the route to take plus any extra
/// transformers bound only for this named route, applied after the route's
/// own transformers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRouteHop {
    pub route: String,
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
}

/// One entry of the `named_routes` config block — a fixed hop sequence,
/// validated for source/target adjacency at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRouteConfig {
    pub name: String,
    pub hops: Vec<NamedRouteHop>,
}
