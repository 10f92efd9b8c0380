//! Component C4: the Transfer Graph and its minimax-path planner.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use shepherd_core::config::RouteConfig;
use shepherd_core::errors::PlanError;

use super::route::Route;

/// A directed multigraph of filesystems connected by transfer routes.
/// Nodes are filesystem names; edges are `Route`s.
pub struct TransferGraph {
    graph: DiGraph<String, Route>,
    nodes: FxHashMap<String, NodeIndex>,
    route_names: std::collections::HashSet<String>,
}

/// A path's composite weight so far: max cost over its edges, then path
/// length, then the lexicographic sequence of route names — in that order,
/// matching the edge-weight tie-break rule. `Ord` on this tuple drives the
/// priority queue directly.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathWeight {
    max_cost: u32,
    path_len: usize,
    route_names: Vec<String>,
}

impl PartialOrd for PathWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.max_cost
            .cmp(&other.max_cost)
            .then_with(|| self.path_len.cmp(&other.path_len))
            .then_with(|| self.route_names.cmp(&other.route_names))
    }
}

/// A frontier entry in the minimax search. Wrapped in `Reverse` at push
/// time would also work, but implementing `Ord` in reverse directly keeps
/// `BinaryHeap::pop` returning the smallest `PathWeight` without an extra
/// newtype at every call site.
struct Frontier {
    weight: PathWeight,
    node: NodeIndex,
    path: Vec<Route>,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight
    }
}
impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest PathWeight pops first.
        other.weight.cmp(&self.weight)
    }
}

impl TransferGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            route_names: std::collections::HashSet::new(),
        }
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// Registers a filesystem as a graph vertex. Idempotent — adding the
    /// same name twice is a no-op, since the vertex set is just the
    /// filesystem name space.
    pub fn add_filesystem(&mut self, name: &str) {
        self.ensure_node(name);
    }

    /// Adds a transfer route as a graph edge. Rejects a route whose name
    /// collides with one already registered.
    pub fn add_route(&mut self, route: Route) -> Result<(), PlanError> {
        if !self.route_names.insert(route.name.clone()) {
            return Err(PlanError::DuplicateRoute(route.name));
        }
        let source = self.ensure_node(&route.source_fs);
        let target = self.ensure_node(&route.target_fs);
        self.graph.add_edge(source, target, route);
        Ok(())
    }

    /// `plan(src_fs, tgt_fs) -> ordered list of routes` — a minimax-path
    /// search generalizing Dijkstra: composite path weight is `(max cost
    /// over edges, path length, route-name sequence)` compared
    /// lexicographically, not summed — a chain is only as good as its
    /// worst-scaling hop.
    pub fn plan(&self, src_fs: &str, tgt_fs: &str) -> Result<Vec<Route>, PlanError> {
        let no_route = || PlanError::NoRoute {
            from: src_fs.to_string(),
            to: tgt_fs.to_string(),
        };

        let start = *self.nodes.get(src_fs).ok_or_else(no_route)?;
        let target = *self.nodes.get(tgt_fs).ok_or_else(no_route)?;

        if start == target {
            return Ok(Vec::new());
        }

        // `max_cost` doesn't strictly preserve ordering the way a summed
        // weight would: a later edge can `max()` two previously-distinct
        // costs into the same value, at which point the shorter of the two
        // paths should win on the path-length tie-break. A single
        // lexicographically-smallest `PathWeight` settled per node would
        // prune the shorter alternative before that convergence is visible,
        // so `settled` instead keeps every *Pareto-undominated*
        // `(max_cost, path_len)` pair per node — a candidate is only
        // discarded if some already-settled label for that node is `<=` it
        // in both components.
        let mut heap = BinaryHeap::new();
        let mut settled: FxHashMap<NodeIndex, Vec<(u32, usize)>> = FxHashMap::default();

        heap.push(Frontier {
            weight: PathWeight { max_cost: 0, path_len: 0, route_names: Vec::new() },
            node: start,
            path: Vec::new(),
        });

        while let Some(Frontier { weight, node, path }) = heap.pop() {
            if node == target {
                return Ok(path);
            }
            let labels = settled.entry(node).or_default();
            if labels.iter().any(|&(cost, len)| cost <= weight.max_cost && len <= weight.path_len) {
                continue;
            }
            labels.push((weight.max_cost, weight.path_len));

            for edge in self.graph.edges(node) {
                let route = edge.weight();
                let next = edge.target();
                let mut route_names = weight.route_names.clone();
                route_names.push(route.name.clone());
                let candidate = PathWeight {
                    max_cost: weight.max_cost.max(route.cost),
                    path_len: weight.path_len + 1,
                    route_names,
                };
                if let Some(next_labels) = settled.get(&next) {
                    if next_labels.iter().any(|&(cost, len)| cost <= candidate.max_cost && len <= candidate.path_len) {
                        continue;
                    }
                }
                let mut next_path = path.clone();
                next_path.push(route.clone());
                heap.push(Frontier { weight: candidate, node: next, path: next_path });
            }
        }

        Err(no_route())
    }

    /// `resolve_named(hops) -> ordered list of routes`, validating the
    /// adjacency invariant `route[i+1].source_fs == route[i].target_fs`.
    pub fn resolve_named(&self, name: &str, hops: &[String]) -> Result<Vec<Route>, PlanError> {
        let mut routes = Vec::with_capacity(hops.len());
        for (hop, route_name) in hops.iter().enumerate() {
            let route = self
                .find_route(route_name)
                .ok_or_else(|| PlanError::UnknownRoute { name: name.to_string(), route: route_name.clone(), hop })?;
            if let Some(prev) = routes.last() {
                let prev_route: &Route = prev;
                if prev_route.target_fs != route.source_fs {
                    return Err(PlanError::InvalidNamedRoute {
                        name: name.to_string(),
                        hop: hop - 1,
                        target: prev_route.target_fs.clone(),
                        next_hop: hop,
                        next_source: route.source_fs.clone(),
                    });
                }
            }
            routes.push(route.clone());
        }
        Ok(routes)
    }

    fn find_route(&self, name: &str) -> Option<&Route> {
        self.graph.edge_weights().find(|route| route.name == name)
    }

    /// Builds a graph from the `transfers` config block, in file order.
    /// Returns the graph alongside a route-name-keyed lookup of the source
    /// `RouteConfig` rows, which `bind_hops` needs to render each hop's
    /// transformer options and script template.
    pub fn from_route_configs(configs: &[RouteConfig]) -> Result<(Self, std::collections::HashMap<String, RouteConfig>), PlanError> {
        let mut graph = Self::new();
        let mut by_name = std::collections::HashMap::with_capacity(configs.len());
        for config in configs {
            graph.add_route(Route::from_config(config))?;
            by_name.insert(config.name.clone(), config.clone());
        }
        Ok((graph, by_name))
    }
}

impl Default for TransferGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, source: &str, target: &str, cost: u32) -> Route {
        Route {
            name: name.to_string(),
            source_fs: source.to_string(),
            target_fs: target.to_string(),
            transformers: Vec::new(),
            script_template: "cp {{ source }} {{ target }}".to_string(),
            cost,
        }
    }

    #[test]
    fn plan_fails_with_no_route_when_unreachable() {
        let mut graph = TransferGraph::new();
        graph.add_filesystem("a");
        graph.add_filesystem("b");
        let err = graph.plan("a", "b").unwrap_err();
        assert!(matches!(err, PlanError::NoRoute { .. }));
    }

    #[test]
    fn plan_prefers_lower_max_cost_over_direct_route() {
        // a -> b direct cost 2; a -> c cost 1 -> b cost 1: max cost 1 wins
        // even though the two-hop path is longer.
        let mut graph = TransferGraph::new();
        graph.add_route(route("direct", "a", "b", 2)).unwrap();
        graph.add_route(route("a-to-c", "a", "c", 1)).unwrap();
        graph.add_route(route("c-to-b", "c", "b", 1)).unwrap();

        let plan = graph.plan("a", "b").unwrap();
        let names: Vec<&str> = plan.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a-to-c", "c-to-b"]);
    }

    #[test]
    fn plan_tie_breaks_by_path_length_even_after_an_early_prune() {
        // a->m is reachable two ways: a short-but-expensive direct hop
        // (cost 5, length 1) and a long-but-cheap chain through m1/m2
        // (max cost 1, length 3). The chain settles m first since its max
        // cost is lower. A final m->target hop at cost 5 then equalizes
        // both routes' max cost to 5 — at that point the direct route
        // should win on path length, which requires the direct route to
        // m not have been discarded when the chain settled first.
        let mut graph = TransferGraph::new();
        graph.add_route(route("a-to-m1", "a", "m1", 1)).unwrap();
        graph.add_route(route("m1-to-m2", "m1", "m2", 1)).unwrap();
        graph.add_route(route("m2-to-m", "m2", "m", 1)).unwrap();
        graph.add_route(route("a-to-m-direct", "a", "m", 5)).unwrap();
        graph.add_route(route("m-to-target", "m", "target", 5)).unwrap();

        let plan = graph.plan("a", "target").unwrap();
        let names: Vec<&str> = plan.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a-to-m-direct", "m-to-target"]);
    }

    #[test]
    fn plan_rejects_duplicate_route_names() {
        let mut graph = TransferGraph::new();
        graph.add_route(route("r1", "a", "b", 1)).unwrap();
        let err = graph.add_route(route("r1", "b", "c", 1)).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateRoute(name) if name == "r1"));
    }

    #[test]
    fn resolve_named_validates_adjacency() {
        let mut graph = TransferGraph::new();
        graph.add_route(route("hop1", "a", "b", 1)).unwrap();
        graph.add_route(route("hop2", "c", "d", 1)).unwrap();

        let hops = vec!["hop1".to_string(), "hop2".to_string()];
        let err = graph.resolve_named("broken", &hops).unwrap_err();
        assert!(matches!(err, PlanError::InvalidNamedRoute { .. }));
    }

    #[test]
    fn resolve_named_succeeds_for_adjacent_hops() {
        let mut graph = TransferGraph::new();
        graph.add_route(route("hop1", "a", "b", 1)).unwrap();
        graph.add_route(route("hop2", "b", "c", 1)).unwrap();

        let hops = vec!["hop1".to_string(), "hop2".to_string()];
        let routes = graph.resolve_named("chain", &hops).unwrap();
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn from_route_configs_builds_graph_and_config_lookup() {
        use shepherd_core::config::{RouteConfig, TransformerConfig};

        let configs = vec![
            RouteConfig {
                name: "scratch-to-archive".to_string(),
                source: "scratch".to_string(),
                target: "archive".to_string(),
                transformers: vec![TransformerConfig { kind: "prefix".to_string(), options: vec!["/archive".to_string()] }],
                script: "cp {{ source }} {{ target }}".to_string(),
                cost: 1,
            },
        ];

        let (graph, by_name) = TransferGraph::from_route_configs(&configs).unwrap();
        let routes = graph.plan("scratch", "archive").unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].transformers, vec!["prefix".to_string()]);
        assert!(by_name.contains_key("scratch-to-archive"));
    }

    #[test]
    fn from_route_configs_rejects_duplicate_names() {
        use shepherd_core::config::RouteConfig;

        let make = |source: &str, target: &str| RouteConfig {
            name: "dup".to_string(),
            source: source.to_string(),
            target: target.to_string(),
            transformers: Vec::new(),
            script: "cp {{ source }} {{ target }}".to_string(),
            cost: 1,
        };
        let configs = vec![make("a", "b"), make("b", "c")];

        let err = TransferGraph::from_route_configs(&configs).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateRoute(name) if name == "dup"));
    }
}
