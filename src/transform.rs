//! IR-level passes that run on a single target's working copy before
//! materialization: initializer relocation and mutation-to-setter rewriting.

use std::collections::HashSet;

use crate::component::{Component, HookEntry, HookKind, Node, StateKind};
use crate::materialize::Flavor;
use crate::rewrite::{
    self, extract_identifiers, receiver_properties, restyle_expression, RewriteRules,
};

/// Neutral initializer left behind when a declaration is relocated into the
/// init hook. Stable across runs: a relocated entry contains no references,
/// so re-running the pass is a no-op.
pub const RELOCATED_PLACEHOLDER: &str = "null";

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCE NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Relocate `value`-kind initializers that reference other state entries or
/// props into the init hook.
///
/// A declaration-time initializer cannot see its sibling declarations, so
/// `doubled: count * 2` is invalid where it stands. The pass rewrites such
/// references to the unified receiver form (`state.count` / `props.step`),
/// replaces the declared initializer with `null`, and prepends
/// `state.doubled = state.count * 2;` to the init hook. Entries are visited
/// in REVERSE declaration order and each statement is PREPENDED, so the
/// final init-hook sequence runs in original top-to-bottom declaration
/// order; an entry depending on an earlier one therefore runs after it.
///
/// Getter, method and function entries execute lazily and are never
/// relocated. Empty initializers are skipped.
pub fn relocate_state_references(component: &mut Component) {
    let state_keys: HashSet<String> = component.state_keys().into_iter().collect();
    let prop_names: HashSet<String> = component.prop_names().into_iter().collect();

    // Canonical receiver form; getter invocation styling happens later, at
    // materialization.
    let rules = RewriteRules {
        state_keys: state_keys.clone(),
        prop_names: prop_names.clone(),
        getter_keys: HashSet::new(),
        state_prefix: Some("state".to_string()),
        props_prefix: Some("props".to_string()),
        getter_prefix: None,
    };

    for i in (0..component.state.len()).rev() {
        let entry = &component.state[i];
        if entry.kind != StateKind::Value {
            continue;
        }
        if entry.code.trim().is_empty() || entry.code.trim() == RELOCATED_PLACEHOLDER {
            continue;
        }
        if !references_component_values(&entry.code, &state_keys, &prop_names) {
            continue;
        }

        let key = entry.key.clone();
        let rewritten = restyle_expression(&entry.code, &rules);
        let statement = format!("state.{} = {};", key, rewritten);

        let hook = component
            .hooks
            .entry(HookKind::Init)
            .or_insert_with(HookEntry::default);
        hook.code = if hook.code.is_empty() {
            statement
        } else {
            format!("{}\n{}", statement, hook.code)
        };

        component.state[i].code = RELOCATED_PLACEHOLDER.to_string();
    }
}

/// Token-level check: does this initializer mention a state key or prop,
/// either bare or through a receiver (`state.x`, `props.x`, `this.x`)?
fn references_component_values(
    code: &str,
    state_keys: &HashSet<String>,
    prop_names: &HashSet<String>,
) -> bool {
    let idents = extract_identifiers(code);
    if idents
        .iter()
        .any(|t| state_keys.contains(t) || prop_names.contains(t))
    {
        return true;
    }
    receiver_properties(code)
        .iter()
        .any(|t| state_keys.contains(t) || prop_names.contains(t))
}

// ═══════════════════════════════════════════════════════════════════════════════
// MUTATION -> SETTER REWRITE
// ═══════════════════════════════════════════════════════════════════════════════

/// Rewrite direct state mutations into setter calls for flavors built on
/// immutable snapshots. Only the pair flavor requires it; for every other
/// flavor this engine is a pass-through.
pub fn rewrite_mutations_to_setters(component: &mut Component, flavor: Flavor) {
    if flavor != Flavor::IndependentPairs {
        return;
    }

    let state_keys: HashSet<String> = component.state_keys().into_iter().collect();

    for hook in component.hooks.values_mut() {
        hook.code = rewrite::rewrite_assignments_to_setters(&hook.code, &state_keys);
    }

    // Getter/method/function bodies mutate state the same way handlers do.
    // Value initializers are left alone: relocation has already emptied the
    // ones that touch other fields.
    for entry in &mut component.state {
        if entry.kind != StateKind::Value {
            entry.code = rewrite::rewrite_assignments_to_setters(&entry.code, &state_keys);
        }
    }

    rewrite_node_bindings(&mut component.nodes, &state_keys);
}

fn rewrite_node_bindings(nodes: &mut [Node], state_keys: &HashSet<String>) {
    for node in nodes {
        for binding in &mut node.bindings {
            binding.code = rewrite::rewrite_assignments_to_setters(&binding.code, state_keys);
        }
        rewrite_node_bindings(&mut node.children, state_keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BindingEntry, StateEntry};

    fn component(entries: Vec<StateEntry>) -> Component {
        Component {
            name: "Sample".to_string(),
            state: entries,
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_initializers_stay_declarative() {
        let mut c = component(vec![
            StateEntry::value("count", "0"),
            StateEntry::value("label", "\"ready\""),
        ]);
        relocate_state_references(&mut c);
        assert_eq!(c.state[0].code, "0");
        assert_eq!(c.state[1].code, "\"ready\"");
        assert!(c.hooks.get(&HookKind::Init).is_none());
    }

    #[test]
    fn test_dependent_initializer_is_relocated() {
        let mut c = component(vec![
            StateEntry::value("count", "0"),
            StateEntry::value("doubled", "count * 2"),
        ]);
        relocate_state_references(&mut c);

        assert_eq!(c.state[0].code, "0");
        assert_eq!(c.state[1].code, RELOCATED_PLACEHOLDER);
        let init = c.hook_code(HookKind::Init).unwrap();
        assert_eq!(init, "state.doubled = state.count * 2;");
    }

    #[test]
    fn test_relocation_preserves_declaration_order() {
        let mut c = component(vec![
            StateEntry::value("base", "props.start"),
            StateEntry::value("doubled", "base * 2"),
        ]);
        c.props.push(crate::component::PropDef::new("start"));
        relocate_state_references(&mut c);

        let init = c.hook_code(HookKind::Init).unwrap();
        let base_at = init.find("state.base =").unwrap();
        let doubled_at = init.find("state.doubled =").unwrap();
        assert!(
            base_at < doubled_at,
            "base must initialize before doubled: {}",
            init
        );
        assert_eq!(
            init,
            "state.base = props.start;\nstate.doubled = state.base * 2;"
        );
    }

    #[test]
    fn test_relocated_statements_precede_existing_init_code() {
        let mut c = component(vec![StateEntry::value("doubled", "count * 2")]);
        c.state.insert(0, StateEntry::value("count", "0"));
        c.hooks.insert(
            HookKind::Init,
            HookEntry {
                code: "console.log(state.doubled);".to_string(),
            },
        );
        relocate_state_references(&mut c);

        let init = c.hook_code(HookKind::Init).unwrap();
        assert_eq!(
            init,
            "state.doubled = state.count * 2;\nconsole.log(state.doubled);"
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut c = component(vec![
            StateEntry::value("count", "0"),
            StateEntry::value("doubled", "count * 2"),
        ]);
        relocate_state_references(&mut c);
        let once = serde_json::to_string(&c).unwrap();
        relocate_state_references(&mut c);
        let twice = serde_json::to_string(&c).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_getters_are_not_relocated() {
        let mut c = component(vec![
            StateEntry::value("name", "\"raw\""),
            StateEntry::getter("shout", "return this.name.toUpperCase();"),
        ]);
        relocate_state_references(&mut c);

        assert_eq!(c.state[1].code, "return this.name.toUpperCase();");
        assert!(c.hooks.get(&HookKind::Init).is_none());
    }

    #[test]
    fn test_empty_initializer_is_skipped() {
        let mut c = component(vec![StateEntry::value("pending", "")]);
        relocate_state_references(&mut c);
        assert_eq!(c.state[0].code, "");
        assert!(c.hooks.get(&HookKind::Init).is_none());
    }

    #[test]
    fn test_unparsable_initializer_is_relocated_unrewritten() {
        // The token scan sees a reference but the fragment does not parse;
        // the rewrite leaves the text as-is and the statement still moves.
        let mut c = component(vec![
            StateEntry::value("count", "0"),
            StateEntry::value("odd", "count +* 2"),
        ]);
        relocate_state_references(&mut c);
        let init = c.hook_code(HookKind::Init).unwrap();
        assert_eq!(init, "state.odd = count +* 2;");
    }

    #[test]
    fn test_setter_rewrite_in_hooks_and_bindings() {
        let mut c = component(vec![StateEntry::value("count", "0")]);
        c.hooks.insert(
            HookKind::Mount,
            HookEntry {
                code: "count = 10;".to_string(),
            },
        );
        let mut button = Node::element("button");
        button
            .bindings
            .push(BindingEntry::handler("onClick", "count = count + 1;", &["event"]));
        c.nodes.push(button);

        rewrite_mutations_to_setters(&mut c, Flavor::IndependentPairs);

        assert_eq!(c.hook_code(HookKind::Mount).unwrap(), "setCount(10);");
        assert_eq!(c.nodes[0].bindings[0].code, "setCount(count + 1);");
    }

    #[test]
    fn test_setter_rewrite_reaches_methods() {
        let mut c = component(vec![
            StateEntry::value("count", "0"),
            StateEntry::method("bump", "function bump() { count = count + 1; }"),
        ]);
        rewrite_mutations_to_setters(&mut c, Flavor::IndependentPairs);
        assert_eq!(
            c.state[1].code,
            "function bump() { setCount(count + 1); }"
        );
    }

    #[test]
    fn test_setter_rewrite_is_pass_through_for_other_flavors() {
        for flavor in [
            Flavor::ProxyStore,
            Flavor::ReactiveMutable,
            Flavor::ObservableStore,
            Flavor::ExternalStore,
            Flavor::PlainVariables,
        ] {
            let mut c = component(vec![StateEntry::value("count", "0")]);
            c.hooks.insert(
                HookKind::Mount,
                HookEntry {
                    code: "count = count + 1;".to_string(),
                },
            );
            rewrite_mutations_to_setters(&mut c, flavor);
            assert_eq!(
                c.hook_code(HookKind::Mount).unwrap(),
                "count = count + 1;",
                "flavor {:?} must not rewrite",
                flavor
            );
        }
    }
}
