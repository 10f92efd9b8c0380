//! Property-based tests for the Planning Engine's algebraic guarantees.
//!
//! Verified here:
//! 1. Template round-trip: `render(t, env1) == render(t, env2)` whenever
//!    `env1` and `env2` agree on every variable `t` actually references.

use std::collections::HashMap;

use proptest::prelude::*;
use shepherd_planner::TemplateEngine;

/// Generates a template referencing a fixed set of variable names, plus two
/// environments that agree on those names but may otherwise diverge.
fn template_and_agreeing_envs() -> impl Strategy<Value = (String, HashMap<String, String>, HashMap<String, String>)> {
    let var_names = prop::collection::vec("[a-z]{1,6}", 1..=4).prop_map(|mut names| {
        names.sort();
        names.dedup();
        names
    });

    var_names.prop_flat_map(|names| {
        let template = names.iter().map(|n| format!("{{{{ {n} }}}}")).collect::<Vec<_>>().join("/");
        let used_values = prop::collection::vec("[a-zA-Z0-9_]{0,8}", names.len());
        let extra_key = "[a-z]{1,6}";
        let extra_value = "[a-zA-Z0-9_]{0,8}";
        (Just(template), Just(names), used_values, extra_key, extra_value)
    }).prop_map(|(template, names, used_values, extra_key, extra_value)| {
        let mut env1: HashMap<String, String> = names.iter().cloned().zip(used_values.iter().cloned()).collect();
        let mut env2 = env1.clone();

        // env2 additionally carries an unrelated variable the template never
        // references — the round-trip law only requires agreement on
        // `used_vars(t)`, not on the full environment.
        if !names.contains(&extra_key) {
            env1.insert(extra_key.clone(), "env1-only".to_string());
            env2.insert(extra_key, extra_value);
        }

        (template, env1, env2)
    })
}

proptest! {
    #[test]
    fn render_is_stable_across_environments_that_agree_on_used_vars(
        (template, env1, env2) in template_and_agreeing_envs()
    ) {
        let mut engine1 = TemplateEngine::new();
        let mut engine2 = TemplateEngine::new();
        let out1 = engine1.render(&template, &env1, "property-test").unwrap();
        let out2 = engine2.render(&template, &env2, "property-test").unwrap();
        prop_assert_eq!(out1, out2);
    }
}
