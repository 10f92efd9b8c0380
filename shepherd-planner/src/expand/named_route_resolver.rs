//! Component C5: the Named-Route Resolver.

use std::collections::HashMap;

use shepherd_core::config::{NamedRouteConfig, RouteConfig, TransformerConfig};
use shepherd_core::errors::PlanError;

use crate::graph::{Route, TransferGraph};
use crate::registry::{build_builtin, Transformer};
use crate::template::TemplateEngine;

use std::sync::Arc;

/// A single hop of a resolved route chain: the route itself plus its
/// transformer pipeline, instantiated with options rendered against the
/// effective environment and frozen.
pub struct ResolvedHop {
    pub route: Route,
    pub transformers: Vec<Arc<dyn Transformer>>,
}

/// Validates a named route's adjacency invariant, binds each hop's route-level
/// transformers, then appends the named route's own per-hop extra
/// transformers after them, left-to-right.
pub fn resolve_named_route(
    graph: &TransferGraph,
    route_configs: &HashMap<String, RouteConfig>,
    template: &mut TemplateEngine,
    named_route: &NamedRouteConfig,
    env: &HashMap<String, String>,
) -> Result<Vec<ResolvedHop>, PlanError> {
    let hop_names: Vec<String> = named_route.hops.iter().map(|hop| hop.route.clone()).collect();
    let routes = graph.resolve_named(&named_route.name, &hop_names)?;
    let mut resolved = bind_hops(&routes, route_configs, template, env)?;

    for (hop, named_hop) in resolved.iter_mut().zip(&named_route.hops) {
        for transformer_config in &named_hop.transformers {
            let site_route = &hop.route.name;
            let transformer = render_transformer(transformer_config, site_route, template, env)?;
            hop.transformers.push(transformer);
        }
    }

    Ok(resolved)
}

/// Same hop-binding step, applied to a `plan()` result instead of a
/// pre-declared named route — both C4 operations share this post-processing.
pub fn bind_hops(
    routes: &[Route],
    route_configs: &HashMap<String, RouteConfig>,
    template: &mut TemplateEngine,
    env: &HashMap<String, String>,
) -> Result<Vec<ResolvedHop>, PlanError> {
    let mut resolved = Vec::with_capacity(routes.len());
    for route in routes {
        let config = route_configs.get(&route.name);
        let mut transformers = Vec::new();
        if let Some(config) = config {
            for transformer_config in &config.transformers {
                transformers.push(render_transformer(transformer_config, &route.name, template, env)?);
            }
        }
        resolved.push(ResolvedHop { route: route.clone(), transformers });
    }
    Ok(resolved)
}

/// Renders a transformer's unrendered option templates against `env` and
/// constructs the frozen built-in instance.
fn render_transformer(
    transformer_config: &TransformerConfig,
    route_name: &str,
    template: &mut TemplateEngine,
    env: &HashMap<String, String>,
) -> Result<Arc<dyn Transformer>, PlanError> {
    let mut rendered_options = Vec::with_capacity(transformer_config.options.len());
    for (index, option) in transformer_config.options.iter().enumerate() {
        let site = format!("route '{route_name}' transformer '{}' option {index}", transformer_config.kind);
        rendered_options.push(template.render(option, env, &site)?);
    }
    build_builtin(&transformer_config.kind, &rendered_options)
}
