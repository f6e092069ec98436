use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT IR
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical, framework-agnostic representation of one component.
///
/// Produced once per compilation from the upstream parser's output; every
/// target generation works on its own deep copy (see `pipeline`). State entry
/// order is the source declaration order and is significant for the
/// normalization pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub props: Vec<PropDef>,
    #[serde(default)]
    pub state: Vec<StateEntry>,
    #[serde(default)]
    pub hooks: HashMap<HookKind, HookEntry>,
    #[serde(default)]
    pub imports: Vec<ImportEntry>,
    #[serde(default)]
    pub context: Vec<ContextRef>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Component {
    pub fn state_keys(&self) -> Vec<String> {
        self.state.iter().map(|e| e.key.clone()).collect()
    }

    pub fn prop_names(&self) -> Vec<String> {
        self.props.iter().map(|p| p.name.clone()).collect()
    }

    pub fn state_entry(&self, key: &str) -> Option<&StateEntry> {
        self.state.iter().find(|e| e.key == key)
    }

    /// Keys of getter-kind entries. References to these are rewritten into
    /// invocations during materialization.
    pub fn getter_keys(&self) -> Vec<String> {
        self.state
            .iter()
            .filter(|e| e.kind == StateKind::Getter)
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn hook_code(&self, kind: HookKind) -> Option<&str> {
        self.hooks.get(&kind).map(|h| h.code.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE ENTRIES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    /// Plain reactive value; `code` is the initializer expression.
    Value,
    /// Derived value; `code` is the accessor body (statement sequence).
    Getter,
    /// Method stored as `name(args) { body }` or full function text.
    Method,
    /// Function stored verbatim.
    Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    pub key: String,
    pub kind: StateKind,
    /// Expression text for value/getter, function text for method/function.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub type_annotation: Option<String>,
}

impl StateEntry {
    pub fn value(key: &str, code: &str) -> Self {
        StateEntry {
            key: key.to_string(),
            kind: StateKind::Value,
            code: code.to_string(),
            type_annotation: None,
        }
    }

    pub fn getter(key: &str, code: &str) -> Self {
        StateEntry {
            key: key.to_string(),
            kind: StateKind::Getter,
            code: code.to_string(),
            type_annotation: None,
        }
    }

    pub fn method(key: &str, code: &str) -> Self {
        StateEntry {
            key: key.to_string(),
            kind: StateKind::Method,
            code: code.to_string(),
            type_annotation: None,
        }
    }

    pub fn function(key: &str, code: &str) -> Self {
        StateEntry {
            key: key.to_string(),
            kind: StateKind::Function,
            code: code.to_string(),
            type_annotation: None,
        }
    }
}

/// Setter identifier generated for a state field under the pair flavor:
/// `count` -> `setCount`.
pub fn setter_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIFECYCLE HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    /// Pre-creation. Runs before the first render; receives relocated state
    /// initializers from the normalization pass.
    Init,
    /// Post-mount.
    Mount,
    Update,
    Unmount,
    /// Carried for upstream compatibility; no current target maps it.
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookEntry {
    /// Statement sequence, stored as text.
    #[serde(default)]
    pub code: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROPS / IMPORTS / CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropDef {
    pub name: String,
    #[serde(default)]
    pub type_annotation: Option<String>,
}

impl PropDef {
    pub fn new(name: &str) -> Self {
        PropDef {
            name: name.to_string(),
            type_annotation: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEntry {
    pub source: String,
    #[serde(default)]
    pub specifiers: Vec<String>,
    #[serde(default)]
    pub default_specifier: Option<String>,
}

impl ImportEntry {
    pub fn named(source: &str, specifiers: &[&str]) -> Self {
        ImportEntry {
            source: source.to_string(),
            specifiers: specifiers.iter().map(|s| s.to_string()).collect(),
            default_specifier: None,
        }
    }

    pub fn default_import(source: &str, name: &str) -> Self {
        ImportEntry {
            source: source.to_string(),
            specifiers: Vec::new(),
            default_specifier: Some(name.to_string()),
        }
    }
}

/// A consumed context value: `name` is the local binding, `source` the module
/// exporting the context object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRef {
    pub name: String,
    pub source: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE TREE
// ═══════════════════════════════════════════════════════════════════════════════

/// Marker set on a node rendered once per item of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repeat {
    /// The iterated collection expression.
    pub source: String,
    pub item: String,
    #[serde(default)]
    pub index: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingEntry {
    pub name: String,
    pub code: String,
    /// Handler argument names for event bindings (`onClick` etc.); empty for
    /// plain attribute bindings.
    #[serde(default)]
    pub args: Vec<String>,
}

impl BindingEntry {
    pub fn new(name: &str, code: &str) -> Self {
        BindingEntry {
            name: name.to_string(),
            code: code.to_string(),
            args: Vec::new(),
        }
    }

    pub fn handler(name: &str, code: &str, args: &[&str]) -> Self {
        BindingEntry {
            name: name.to_string(),
            code: code.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Event bindings hold statement sequences; everything else holds a
    /// single expression.
    pub fn is_event(&self) -> bool {
        !self.args.is_empty() || (self.name.starts_with("on") && self.name.len() > 2)
    }
}

/// One markup node: an element (`div`) or child component (`Card`). Static
/// text is the property `text`; interpolated text is the binding `text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<StaticProperty>,
    #[serde(default)]
    pub bindings: Vec<BindingEntry>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub repeat: Option<Repeat>,
}

impl Node {
    pub fn element(name: &str) -> Self {
        Node {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn text(value: &str) -> Self {
        Node {
            properties: vec![StaticProperty {
                name: "text".to_string(),
                value: value.to_string(),
            }],
            ..Default::default()
        }
    }

    pub fn binding(&self, name: &str) -> Option<&BindingEntry> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_component(&self) -> bool {
        self.name
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
    }

    /// Whether this repetition node's first rendered child supplies an
    /// explicit, non-empty identity key. Derived, never stored: inspects only
    /// the first child's binding table. False for non-repeat nodes, childless
    /// repeats, and absent or empty `key` bindings. Steers keyed versus
    /// positional rendering in the emitters.
    pub fn has_keyed_items(&self) -> bool {
        if self.repeat.is_none() {
            return false;
        }
        match self.children.first() {
            Some(child) => child
                .binding("key")
                .map(|b| !b.code.trim().is_empty())
                .unwrap_or(false),
            None => false,
        }
    }
}
