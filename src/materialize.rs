//! State materialization: given a normalized component and a reactivity
//! flavor, decide how every state entry is declared and how the rest of the
//! component refers to it. Output is a set of per-entry records; the
//! emitters own the surface syntax.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::component::{setter_name, Component, Node, StateKind};
use crate::rewrite::{restyle_expression, restyle_statements, RewriteRules};

// ═══════════════════════════════════════════════════════════════════════════════
// FLAVORS
// ═══════════════════════════════════════════════════════════════════════════════

/// The reactivity model a target declares state with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// One value/setter pair per entry; mutations become setter calls.
    IndependentPairs,
    /// One mutable proxy object shared by all entries.
    ProxyStore,
    /// One reactive object, mutated in place.
    ReactiveMutable,
    /// Class-style observable store; the instance is the receiver.
    ObservableStore,
    /// Store object registered with an external runtime.
    ExternalStore,
    /// Plain variables; assignment is the reactivity primitive.
    PlainVariables,
}

impl Flavor {
    /// Store flavors aggregate value entries into one shared initializer
    /// object.
    pub fn is_store(self) -> bool {
        matches!(
            self,
            Flavor::ProxyStore
                | Flavor::ReactiveMutable
                | Flavor::ObservableStore
                | Flavor::ExternalStore
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATERIALIZED RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Declaration shape decided for one state entry. Not final source text:
/// the emitter renders each record with its own primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializedEntry {
    /// `value` under IndependentPairs. The initializer must be wrapped by
    /// the emitter so it runs exactly once, at first materialization.
    ValuePair {
        key: String,
        setter: String,
        init: String,
        type_annotation: Option<String>,
    },
    /// `value` under PlainVariables.
    PlainVariable {
        key: String,
        init: String,
        type_annotation: Option<String>,
    },
    /// `value` under a store flavor: one slot of the shared initializer.
    StoreSlot { key: String, init: String },
    /// `getter`: a zero-argument accessor function; references elsewhere
    /// have been rewritten into invocations.
    Accessor { key: String, body: String },
    /// `method`, function prefix ensured.
    Method { key: String, code: String },
    /// `function`, passed through.
    Helper { key: String, code: String },
}

impl MaterializedEntry {
    pub fn key(&self) -> &str {
        match self {
            MaterializedEntry::ValuePair { key, .. }
            | MaterializedEntry::PlainVariable { key, .. }
            | MaterializedEntry::StoreSlot { key, .. }
            | MaterializedEntry::Accessor { key, .. }
            | MaterializedEntry::Method { key, .. }
            | MaterializedEntry::Helper { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateLayout {
    pub flavor: Flavor,
    pub entries: Vec<MaterializedEntry>,
}

impl StateLayout {
    /// Slots of the shared store initializer, in declaration order.
    pub fn store_slots(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                MaterializedEntry::StoreSlot { key, init } => Some((key.as_str(), init.as_str())),
                _ => None,
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFERENCE STYLE
// ═══════════════════════════════════════════════════════════════════════════════

/// The reference convention all other code must use, split by context:
/// hook/state code versus template binding code. `None` means the bare
/// field identifier. Getters get their own pair because they compile to
/// standalone functions everywhere except `this`-receiver targets, where
/// they are member methods.
#[derive(Debug, Clone)]
pub struct ReferenceStyle {
    pub state_code: Option<String>,
    pub state_template: Option<String>,
    pub props_code: Option<String>,
    pub props_template: Option<String>,
    pub getter_code: Option<String>,
    pub getter_template: Option<String>,
}

/// Per-flavor reference convention. The receiver identifier itself comes
/// from the target (`state` for function components, `this` for
/// class/object-method targets); `this`-receiver targets resolve bare names
/// in their templates, so their template style is bare.
pub fn reference_style(flavor: Flavor, receiver: &str) -> ReferenceStyle {
    let recv = Some(receiver.to_string());
    let is_instance = receiver == "this";
    let template_recv = if is_instance {
        None
    } else {
        Some(receiver.to_string())
    };
    // Accessors ride on the instance only where the instance exists.
    let getter_code = if is_instance { recv.clone() } else { None };
    let props = Some("props".to_string());

    match flavor {
        Flavor::IndependentPairs => ReferenceStyle {
            state_code: None,
            state_template: None,
            props_code: props.clone(),
            props_template: props,
            getter_code: None,
            getter_template: None,
        },
        Flavor::PlainVariables => ReferenceStyle {
            state_code: None,
            state_template: None,
            props_code: None,
            props_template: None,
            getter_code: None,
            getter_template: None,
        },
        Flavor::ObservableStore => ReferenceStyle {
            state_code: recv.clone(),
            state_template: template_recv.clone(),
            props_code: recv,
            props_template: template_recv,
            getter_code,
            getter_template: None,
        },
        Flavor::ProxyStore | Flavor::ReactiveMutable | Flavor::ExternalStore => ReferenceStyle {
            state_code: recv,
            state_template: template_recv,
            props_code: props.clone(),
            props_template: props,
            getter_code,
            getter_template: None,
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATERIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Decide declaration records for every state entry and rewrite all carried
/// code to the flavor's reference convention. Mutates the working copy
/// (hook bodies, state function bodies, template bindings); value
/// initializers are never touched here.
pub fn materialize(component: &mut Component, flavor: Flavor, receiver: &str) -> StateLayout {
    ensure_method_prefixes(component);
    apply_reference_style(component, flavor, receiver);

    let entries = component
        .state
        .iter()
        .map(|entry| match entry.kind {
            StateKind::Value => match flavor {
                Flavor::IndependentPairs => MaterializedEntry::ValuePair {
                    key: entry.key.clone(),
                    setter: setter_name(&entry.key),
                    init: entry.code.clone(),
                    type_annotation: entry.type_annotation.clone(),
                },
                Flavor::PlainVariables => MaterializedEntry::PlainVariable {
                    key: entry.key.clone(),
                    init: entry.code.clone(),
                    type_annotation: entry.type_annotation.clone(),
                },
                _ => MaterializedEntry::StoreSlot {
                    key: entry.key.clone(),
                    init: entry.code.clone(),
                },
            },
            StateKind::Getter => MaterializedEntry::Accessor {
                key: entry.key.clone(),
                body: entry.code.clone(),
            },
            StateKind::Method => MaterializedEntry::Method {
                key: entry.key.clone(),
                code: entry.code.clone(),
            },
            StateKind::Function => MaterializedEntry::Helper {
                key: entry.key.clone(),
                code: entry.code.clone(),
            },
        })
        .collect();

    StateLayout { flavor, entries }
}

/// A method stored as a bare `name(args) { body }` pair gains a
/// `function ` prefix so it parses (and emits) as a declaration.
fn ensure_method_prefixes(component: &mut Component) {
    for entry in &mut component.state {
        if entry.kind == StateKind::Method && !entry.code.trim_start().starts_with("function") {
            entry.code = format!("function {}", entry.code.trim_start());
        }
    }
}

fn apply_reference_style(component: &mut Component, flavor: Flavor, receiver: &str) {
    let style = reference_style(flavor, receiver);
    let state_keys: HashSet<String> = component.state_keys().into_iter().collect();
    let prop_names: HashSet<String> = component.prop_names().into_iter().collect();
    let getter_keys: HashSet<String> = component.getter_keys().into_iter().collect();

    let code_rules = RewriteRules {
        state_keys: state_keys.clone(),
        prop_names: prop_names.clone(),
        getter_keys: getter_keys.clone(),
        state_prefix: style.state_code.clone(),
        props_prefix: style.props_code.clone(),
        getter_prefix: style.getter_code.clone(),
    };
    let template_rules = RewriteRules {
        state_keys,
        prop_names,
        getter_keys,
        state_prefix: style.state_template.clone(),
        props_prefix: style.props_template.clone(),
        getter_prefix: style.getter_template.clone(),
    };

    for hook in component.hooks.values_mut() {
        hook.code = restyle_statements(&hook.code, &code_rules);
    }
    for entry in &mut component.state {
        if entry.kind != StateKind::Value {
            entry.code = restyle_statements(&entry.code, &code_rules);
        }
    }
    restyle_nodes(&mut component.nodes, &template_rules);
}

fn restyle_nodes(nodes: &mut [Node], rules: &RewriteRules) {
    for node in nodes {
        for binding in &mut node.bindings {
            binding.code = if binding.is_event() {
                restyle_statements(&binding.code, rules)
            } else {
                restyle_expression(&binding.code, rules)
            };
        }
        if let Some(repeat) = &mut node.repeat {
            repeat.source = restyle_expression(&repeat.source, rules);
        }
        restyle_nodes(&mut node.children, rules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BindingEntry, HookEntry, HookKind, StateEntry};

    fn sample() -> Component {
        Component {
            name: "Greeter".to_string(),
            state: vec![
                StateEntry::value("name", "\"raw\""),
                StateEntry::getter("shout", "return this.name.toUpperCase();"),
                StateEntry::method("reset", "reset() { name = \"\"; }"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_value_entries_become_pairs() {
        let mut c = sample();
        let layout = materialize(&mut c, Flavor::IndependentPairs, "state");
        match &layout.entries[0] {
            MaterializedEntry::ValuePair { key, setter, init, .. } => {
                assert_eq!(key, "name");
                assert_eq!(setter, "setName");
                assert_eq!(init, "\"raw\"");
            }
            other => panic!("expected pair, got {:?}", other),
        }
    }

    #[test]
    fn test_value_entries_aggregate_into_store_slots() {
        let mut c = sample();
        let layout = materialize(&mut c, Flavor::ProxyStore, "state");
        assert_eq!(layout.store_slots(), vec![("name", "\"raw\"")]);
    }

    #[test]
    fn test_getter_compiles_to_accessor_with_stripped_receiver() {
        let mut c = sample();
        let layout = materialize(&mut c, Flavor::IndependentPairs, "state");
        match &layout.entries[1] {
            MaterializedEntry::Accessor { key, body } => {
                assert_eq!(key, "shout");
                assert_eq!(body, "return name.toUpperCase();");
            }
            other => panic!("expected accessor, got {:?}", other),
        }
    }

    #[test]
    fn test_getter_body_uses_receiver_for_stores() {
        let mut c = sample();
        let layout = materialize(&mut c, Flavor::ReactiveMutable, "state");
        match &layout.entries[1] {
            MaterializedEntry::Accessor { body, .. } => {
                assert_eq!(body, "return state.name.toUpperCase();");
            }
            other => panic!("expected accessor, got {:?}", other),
        }
    }

    #[test]
    fn test_method_gains_function_prefix() {
        let mut c = sample();
        let layout = materialize(&mut c, Flavor::PlainVariables, "state");
        match &layout.entries[2] {
            MaterializedEntry::Method { code, .. } => {
                assert!(code.starts_with("function reset()"), "got: {}", code);
            }
            other => panic!("expected method, got {:?}", other),
        }
    }

    #[test]
    fn test_getter_references_become_invocations() {
        let mut c = sample();
        c.hooks.insert(
            HookKind::Mount,
            HookEntry {
                code: "console.log(shout);".to_string(),
            },
        );
        materialize(&mut c, Flavor::IndependentPairs, "state");
        assert_eq!(
            c.hook_code(HookKind::Mount).unwrap(),
            "console.log(shout());"
        );
    }

    #[test]
    fn test_template_bindings_follow_template_style() {
        let mut c = sample();
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "name"));
        c.nodes.push(span);

        materialize(&mut c, Flavor::ReactiveMutable, "state");
        assert_eq!(c.nodes[0].bindings[0].code, "state.name");
    }

    #[test]
    fn test_class_receiver_targets_keep_templates_bare() {
        let mut c = sample();
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "name"));
        c.nodes.push(span);
        c.hooks.insert(
            HookKind::Init,
            HookEntry {
                code: "name = \"boot\";".to_string(),
            },
        );

        materialize(&mut c, Flavor::ObservableStore, "this");
        assert_eq!(c.nodes[0].bindings[0].code, "name");
        assert_eq!(c.hook_code(HookKind::Init).unwrap(), "this.name = \"boot\";");
    }

    #[test]
    fn test_repeat_source_is_restyled() {
        let mut c = Component {
            name: "List".to_string(),
            state: vec![StateEntry::value("items", "[]")],
            ..Default::default()
        };
        let mut li = Node::element("li");
        li.repeat = Some(crate::component::Repeat {
            source: "items".to_string(),
            item: "item".to_string(),
            index: None,
        });
        c.nodes.push(li);

        materialize(&mut c, Flavor::ProxyStore, "state");
        assert_eq!(c.nodes[0].repeat.as_ref().unwrap().source, "state.items");
    }
}
