//! Component C6: the Task Expander.
//!
//! This module is the pure, I/O-free half of expansion — it turns a
//! resolved hop sequence and a source address into the chain of rendered
//! scripts and addresses a single file needs. Persisting that chain as
//! `DataItem`/`Task` rows, and doing so atomically per file, is
//! `shepherd-storage`'s job (it owns the transaction).

use std::collections::HashMap;

use shepherd_core::errors::PlanError;

use crate::expand::named_route_resolver::ResolvedHop;
use crate::template::{AddressContext, TemplateEngine};

/// One hop of a single file's expansion: the filesystem/address pair on
/// each side and its fully rendered script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTask {
    pub source_fs: String,
    pub source_addr: String,
    pub target_fs: String,
    pub target_addr: String,
    pub script: String,
}

/// The ordered chain of tasks for one source file. `tasks[i]` depends on
/// `tasks[i-1]` succeeding; `tasks[0]` has no dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedChain {
    pub tasks: Vec<ExpandedTask>,
}

/// Expands one source address through `hops`, composing each hop's
/// transformer pipeline to derive its target address, then rendering the
/// hop's script against `env ∪ {source, target}`. Fails before producing
/// any task for this file if any hop's script references an unresolved
/// variable.
pub fn expand_file(
    hops: &[ResolvedHop],
    source_address: &str,
    env: &HashMap<String, String>,
    template: &mut TemplateEngine,
) -> Result<ExpandedChain, PlanError> {
    let mut tasks = Vec::with_capacity(hops.len());
    let mut current_source = source_address.to_string();

    for (hop_index, hop) in hops.iter().enumerate() {
        let mut working_source = current_source.clone();
        let mut target_addr = current_source.clone();
        for transformer in &hop.transformers {
            let (next_source, next_target) = transformer.apply(&working_source, &target_addr, env);
            working_source = next_source;
            target_addr = next_target;
        }

        let source_ctx = AddressContext::new(hop.route.source_fs.clone(), working_source.clone());
        let target_ctx = AddressContext::new(hop.route.target_fs.clone(), target_addr.clone());
        let site = format!("route '{}' hop {hop_index} script", hop.route.name);
        let script = template.render_script(&hop.route.script_template, env, &source_ctx, &target_ctx, &site)?;

        current_source = target_addr.clone();
        tasks.push(ExpandedTask {
            source_fs: hop.route.source_fs.clone(),
            source_addr: working_source,
            target_fs: hop.route.target_fs.clone(),
            target_addr: target_addr.clone(),
            script,
        });
    }

    Ok(ExpandedChain { tasks })
}

/// Expands every source address through the same hop sequence and
/// environment. A failure on one address does not affect the others —
/// each `ExpandedChain` (or failure) is independent, matching the
/// per-file atomicity the persistence step requires.
pub fn expand_files(
    hops: &[ResolvedHop],
    source_addresses: impl IntoIterator<Item = String>,
    env: &HashMap<String, String>,
    template: &mut TemplateEngine,
) -> Vec<Result<ExpandedChain, PlanError>> {
    source_addresses
        .into_iter()
        .map(|address| expand_file(hops, &address, env, template))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Route;
    use crate::registry::Prefix;
    use std::sync::Arc;

    fn hop(name: &str, source: &str, target: &str) -> ResolvedHop {
        ResolvedHop {
            route: Route {
                name: name.to_string(),
                source_fs: source.to_string(),
                target_fs: target.to_string(),
                transformers: Vec::new(),
                script_template: "cp {{ source.address }} {{ target.address }}".to_string(),
                cost: 1,
            },
            transformers: Vec::new(),
        }
    }

    #[test]
    fn two_hop_route_produces_two_chained_tasks() {
        let hops = vec![hop("a-to-b", "a", "b"), hop("b-to-c", "b", "c")];
        let mut template = TemplateEngine::new();
        let chain = expand_file(&hops, "/data/x.bam", &HashMap::new(), &mut template).unwrap();

        assert_eq!(chain.tasks.len(), 2);
        assert_eq!(chain.tasks[0].source_addr, "/data/x.bam");
        assert_eq!(chain.tasks[1].source_addr, chain.tasks[0].target_addr);
        assert_eq!(chain.tasks[0].script, format!("cp /data/x.bam {}", chain.tasks[0].target_addr));
    }

    #[test]
    fn script_can_reference_source_and_target_filesystem() {
        let mut named = hop("a-to-b", "a", "b");
        named.route.script_template = "{{ source.filesystem }}:{{ source.address }} -> {{ target.filesystem }}:{{ target.address }}".to_string();
        let mut template = TemplateEngine::new();
        let chain = expand_file(&[named], "/data/x.bam", &HashMap::new(), &mut template).unwrap();
        assert_eq!(chain.tasks[0].script, format!("a:/data/x.bam -> b:{}", chain.tasks[0].target_addr));
    }

    #[test]
    fn transformer_pipeline_rewrites_target_address() {
        let mut first = hop("a-to-b", "a", "b");
        first.transformers = vec![Arc::new(Prefix { path: "/archive".to_string() })];

        let mut template = TemplateEngine::new();
        let chain = expand_file(&[first], "/in/x.bam", &HashMap::new(), &mut template).unwrap();
        assert_eq!(chain.tasks[0].target_addr, "/archive/in/x.bam");
    }

    #[test]
    fn unresolved_script_variable_fails_before_any_task_is_produced() {
        let mut broken = hop("a-to-b", "a", "b");
        broken.route.script_template = "cp {{ source.address }} {{ missing }}".to_string();

        let mut template = TemplateEngine::new();
        let err = expand_file(&[broken], "/in/x.bam", &HashMap::new(), &mut template).unwrap_err();
        assert!(matches!(err, PlanError::RenderError { .. }));
    }

    #[test]
    fn unresolved_source_attribute_fails() {
        let mut broken = hop("a-to-b", "a", "b");
        broken.route.script_template = "cp {{ source.bogus }} {{ target.address }}".to_string();

        let mut template = TemplateEngine::new();
        let err = expand_file(&[broken], "/in/x.bam", &HashMap::new(), &mut template).unwrap_err();
        assert!(matches!(err, PlanError::RenderError { .. }));
    }

    #[test]
    fn expand_files_isolates_failures_per_address() {
        let good = hop("a-to-b", "a", "b");
        let mut template = TemplateEngine::new();
        let results = expand_files(&[good], vec!["/a".to_string(), "/b".to_string()], &HashMap::new(), &mut template);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
