//! Per-target emitters.
//!
//! Everything surface-level lives here: tag and attribute syntax, lifecycle
//! hook mapping, import assembly. The emitters treat the core's outputs
//! (normalized IR, materialization records, structural signals) as
//! authoritative and never re-run normalization.

use serde::{Deserialize, Serialize};

use crate::component::{Component, ContextRef, HookKind, ImportEntry, Node};
use crate::materialize::{Flavor, MaterializedEntry, StateLayout};

// ═══════════════════════════════════════════════════════════════════════════════
// TARGETS AND OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// The supported output targets. A closed union: adding a target is a new
/// variant plus a new emitter, never a runtime plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    React,
    Solid,
    Vue,
    Svelte,
    Angular,
    Alpine,
}

impl Target {
    pub fn default_flavor(self) -> Flavor {
        match self {
            Target::React => Flavor::IndependentPairs,
            Target::Solid => Flavor::ProxyStore,
            Target::Vue => Flavor::ReactiveMutable,
            Target::Svelte => Flavor::PlainVariables,
            Target::Angular => Flavor::ObservableStore,
            Target::Alpine => Flavor::ExternalStore,
        }
    }

    /// The own-instance receiver this target's emitted code uses.
    pub fn receiver(self) -> &'static str {
        match self {
            Target::React | Target::Solid | Target::Vue | Target::Svelte => "state",
            Target::Angular | Target::Alpine => "this",
        }
    }

    pub fn supports(self, flavor: Flavor) -> bool {
        if flavor == self.default_flavor() {
            return true;
        }
        // React can also materialize into an observable store object.
        matches!(self, Target::React) && flavor == Flavor::ObservableStore
    }

    pub fn name(self) -> &'static str {
        match self {
            Target::React => "react",
            Target::Solid => "solid",
            Target::Vue => "vue",
            Target::Svelte => "svelte",
            Target::Angular => "angular",
            Target::Alpine => "alpine",
        }
    }
}

/// Surface dialect flags, consumed only by emitters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    /// Override the target's natural materialization flavor.
    pub flavor: Option<Flavor>,
    /// Typed-output mode: prop and state type annotations where the target
    /// supports them.
    pub typescript: bool,
    /// Native-rendering mode (React only): react-native imports and tag
    /// mapping.
    pub native: bool,
}

/// One target's generated module: the source text plus the ordered,
/// de-duplicated list of external symbols it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetOutput {
    pub source: String,
    pub imports: Vec<ImportEntry>,
}

pub fn emit(
    target: Target,
    component: &Component,
    layout: &StateLayout,
    options: &GenerateOptions,
) -> TargetOutput {
    match target {
        Target::React => emit_react(component, layout, options),
        Target::Solid => emit_solid(component, layout, options),
        Target::Vue => emit_vue(component, layout, options),
        Target::Svelte => emit_svelte(component, layout, options),
        Target::Angular => emit_angular(component, layout, options),
        Target::Alpine => emit_alpine(component, layout),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct ImportSet {
    entries: Vec<ImportEntry>,
}

impl ImportSet {
    fn add_named(&mut self, source: &str, specifier: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.source == source) {
            if !entry.specifiers.iter().any(|s| s == specifier) {
                entry.specifiers.push(specifier.to_string());
            }
            return;
        }
        self.entries.push(ImportEntry::named(source, &[specifier]));
    }

    fn add_default(&mut self, source: &str, name: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.source == source) {
            if entry.default_specifier.is_none() {
                entry.default_specifier = Some(name.to_string());
            }
            return;
        }
        self.entries.push(ImportEntry::default_import(source, name));
    }

    fn extend_component(&mut self, imports: &[ImportEntry]) {
        for import in imports {
            if let Some(default) = &import.default_specifier {
                self.add_default(&import.source, default);
            }
            for spec in &import.specifiers {
                self.add_named(&import.source, spec);
            }
            if import.default_specifier.is_none() && import.specifiers.is_empty() {
                // Side-effect import.
                if !self.entries.iter().any(|e| e.source == import.source) {
                    self.entries.push(import.clone());
                }
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&render_import(entry));
            out.push('\n');
        }
        out
    }

    fn into_parts(self) -> (String, Vec<ImportEntry>) {
        let rendered = self.render();
        (rendered, self.entries)
    }
}

fn render_import(entry: &ImportEntry) -> String {
    let named = if entry.specifiers.is_empty() {
        None
    } else {
        Some(format!("{{ {} }}", entry.specifiers.join(", ")))
    };
    match (&entry.default_specifier, named) {
        (Some(default), Some(named)) => {
            format!("import {}, {} from \"{}\";", default, named, entry.source)
        }
        (Some(default), None) => format!("import {} from \"{}\";", default, entry.source),
        (None, Some(named)) => format!("import {} from \"{}\";", named, entry.source),
        (None, None) => format!("import \"{}\";", entry.source),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED RENDERING HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Code embedded inside a double-quoted template attribute.
fn escape_attr_code(code: &str) -> String {
    code.replace('"', "&quot;")
}

fn indent_block(code: &str, pad: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::new();
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// The repeated child with its `key` binding removed, for targets where the
/// identity key lives on the repetition construct instead of the element.
fn without_key_binding(node: &Node) -> Node {
    let mut clone = node.clone();
    clone.bindings.retain(|b| b.name != "key");
    clone
}

fn repeat_key_code(node: &Node) -> Option<String> {
    if !node.has_keyed_items() {
        return None;
    }
    node.children
        .first()
        .and_then(|child| child.binding("key"))
        .map(|b| b.code.clone())
}

// ═══════════════════════════════════════════════════════════════════════════════
// REACT
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_react(component: &Component, layout: &StateLayout, options: &GenerateOptions) -> TargetOutput {
    let mut body = String::new();

    // Context consumption first: hooks must run unconditionally, in a stable
    // order.
    for ContextRef { name, source: _ } in &component.context {
        body.push_str(&format!(
            "  const {} = useContext({}Context);\n",
            name,
            pascal_case(name)
        ));
    }
    if !component.context.is_empty() {
        body.push('\n');
    }

    // State declarations.
    if layout.flavor == Flavor::ObservableStore {
        let slots = render_store_slots(layout, "  ");
        body.push_str(&format!(
            "  const state = useLocalObservable(() => ({{\n{}\n  }}));\n\n",
            slots
        ));
    } else {
        for entry in &layout.entries {
            if let MaterializedEntry::ValuePair {
                key,
                setter,
                init,
                type_annotation,
            } = entry
            {
                let init = if init.trim().is_empty() {
                    "undefined"
                } else {
                    init.as_str()
                };
                let generic = match type_annotation {
                    Some(ty) if options.typescript => format!("<{}>", ty),
                    _ => String::new(),
                };
                // The thunk makes the initializer run exactly once, at first
                // materialization, not on every re-render.
                body.push_str(&format!(
                    "  const [{}, {}] = useState{}(() => ({}));\n",
                    key, setter, generic, init
                ));
            }
        }
        body.push('\n');
    }

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body: accessor } => {
                body.push_str(&format!(
                    "  function {}() {{\n{}\n  }}\n\n",
                    key,
                    indent_block(accessor, "    ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                body.push_str(&format!("{}\n\n", indent_block(code, "  ")));
            }
            _ => {}
        }
    }

    // Lifecycle hooks.
    let init = component.hook_code(HookKind::Init).unwrap_or("");
    let mount = component.hook_code(HookKind::Mount).unwrap_or("");
    if !init.is_empty() || !mount.is_empty() {
        let mut code = String::new();
        if !init.is_empty() {
            code.push_str(init);
        }
        if !mount.is_empty() {
            if !code.is_empty() {
                code.push('\n');
            }
            code.push_str(mount);
        }
        body.push_str(&format!(
            "  useEffect(() => {{\n{}\n  }}, []);\n\n",
            indent_block(&code, "    ")
        ));
    }
    if let Some(update) = component.hook_code(HookKind::Update) {
        body.push_str(&format!(
            "  useEffect(() => {{\n{}\n  }});\n\n",
            indent_block(update, "    ")
        ));
    }
    if let Some(unmount) = component.hook_code(HookKind::Unmount) {
        body.push_str(&format!(
            "  useEffect(() => {{\n    return () => {{\n{}\n    }};\n  }}, []);\n\n",
            indent_block(unmount, "      ")
        ));
    }

    let jsx_opts = JsxOptions {
        class_attr: "className",
        native: options.native,
    };
    let jsx = render_jsx_children(&component.nodes, 2, &jsx_opts);

    let props_type = if options.typescript {
        let mut interface = format!("export interface {}Props {{\n", component.name);
        for prop in &component.props {
            interface.push_str(&format!(
                "  {}?: {};\n",
                prop.name,
                prop.type_annotation.as_deref().unwrap_or("any")
            ));
        }
        interface.push_str("}\n\n");
        interface
    } else {
        String::new()
    };
    let props_param = if options.typescript {
        format!("props: {}Props", component.name)
    } else {
        "props".to_string()
    };

    let mut source = String::new();
    let full_body = format!(
        "{}export default function {}({}) {{\n{}  return (\n{}\n  );\n}}\n",
        props_type, component.name, props_param, body, jsx
    );

    // Framework imports are selected by scanning what the body actually
    // uses.
    let mut imports = ImportSet::default();
    for hook in ["useState", "useEffect", "useContext"] {
        if full_body.contains(&format!("{}(", hook)) {
            imports.add_named("react", hook);
        }
    }
    if full_body.contains("useLocalObservable(") {
        imports.add_named("mobx-react-lite", "useLocalObservable");
    }
    if options.native {
        for tag in ["View", "Text", "Image", "TextInput", "Pressable"] {
            if full_body.contains(&format!("<{}", tag)) {
                imports.add_named("react-native", tag);
            }
        }
    }
    for context in &component.context {
        imports.add_default(&context.source, &format!("{}Context", pascal_case(&context.name)));
    }
    imports.extend_component(&component.imports);

    let (rendered_imports, entries) = imports.into_parts();
    if !rendered_imports.is_empty() {
        source.push_str(&rendered_imports);
        source.push('\n');
    }
    source.push_str(&full_body);

    TargetOutput {
        source,
        imports: entries,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOLID
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_solid(component: &Component, layout: &StateLayout, _options: &GenerateOptions) -> TargetOutput {
    let mut body = String::new();

    let slots = layout.store_slots();
    if !slots.is_empty() {
        body.push_str(&format!(
            "  const state = createMutable({{\n{}\n  }});\n\n",
            render_store_slots(layout, "  ")
        ));
    }

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body: accessor } => {
                body.push_str(&format!(
                    "  function {}() {{\n{}\n  }}\n\n",
                    key,
                    indent_block(accessor, "    ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                body.push_str(&format!("{}\n\n", indent_block(code, "  ")));
            }
            _ => {}
        }
    }

    if let Some(init) = component.hook_code(HookKind::Init) {
        body.push_str(&format!("{}\n\n", indent_block(init, "  ")));
    }
    if let Some(mount) = component.hook_code(HookKind::Mount) {
        body.push_str(&format!(
            "  onMount(() => {{\n{}\n  }});\n\n",
            indent_block(mount, "    ")
        ));
    }
    if let Some(update) = component.hook_code(HookKind::Update) {
        body.push_str(&format!(
            "  createEffect(() => {{\n{}\n  }});\n\n",
            indent_block(update, "    ")
        ));
    }
    if let Some(unmount) = component.hook_code(HookKind::Unmount) {
        body.push_str(&format!(
            "  onCleanup(() => {{\n{}\n  }});\n\n",
            indent_block(unmount, "    ")
        ));
    }

    let jsx_opts = JsxOptions {
        class_attr: "class",
        native: false,
    };
    let jsx = render_jsx_children(&component.nodes, 2, &jsx_opts);

    let full_body = format!(
        "export default function {}(props) {{\n{}  return (\n{}\n  );\n}}\n",
        component.name, body, jsx
    );

    let mut imports = ImportSet::default();
    for hook in ["onMount", "onCleanup", "createEffect"] {
        if full_body.contains(&format!("{}(", hook)) {
            imports.add_named("solid-js", hook);
        }
    }
    if full_body.contains("createMutable(") {
        imports.add_named("solid-js/store", "createMutable");
    }
    imports.extend_component(&component.imports);

    let (rendered_imports, entries) = imports.into_parts();
    let mut source = String::new();
    if !rendered_imports.is_empty() {
        source.push_str(&rendered_imports);
        source.push('\n');
    }
    source.push_str(&full_body);

    TargetOutput {
        source,
        imports: entries,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX (REACT / SOLID)
// ═══════════════════════════════════════════════════════════════════════════════

struct JsxOptions {
    class_attr: &'static str,
    native: bool,
}

fn native_tag(tag: &str) -> Option<&'static str> {
    match tag {
        "div" => Some("View"),
        "span" | "p" | "a" => Some("Text"),
        "img" => Some("Image"),
        "input" => Some("TextInput"),
        "button" => Some("Pressable"),
        _ => None,
    }
}

fn render_jsx_children(nodes: &[Node], depth: usize, opts: &JsxOptions) -> String {
    nodes
        .iter()
        .map(|n| render_jsx_node(n, depth, opts))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_jsx_node(node: &Node, depth: usize, opts: &JsxOptions) -> String {
    let pad = "  ".repeat(depth);

    if let Some(repeat) = &node.repeat {
        let params = match &repeat.index {
            Some(index) => format!("({}, {})", repeat.item, index),
            None => format!("({})", repeat.item),
        };
        let inner = render_jsx_children(&node.children, depth + 1, opts);
        return format!(
            "{pad}{{{source}.map({params} => (\n{inner}\n{pad}))}}",
            pad = pad,
            source = repeat.source,
            params = params,
            inner = inner
        );
    }

    // Nameless nodes carry text: a static literal or an interpolation.
    if node.name.is_empty() {
        if let Some(binding) = node.binding("text") {
            let rendered = format!("{}{{{}}}", pad, binding.code);
            return if opts.native {
                format!("{}<Text>{{{}}}</Text>", pad, binding.code)
            } else {
                rendered
            };
        }
        if let Some(text) = node.property("text") {
            return if opts.native {
                format!("{}<Text>{}</Text>", pad, text)
            } else {
                format!("{}{}", pad, text)
            };
        }
        return String::new();
    }

    let tag = if opts.native && !node.is_component() {
        native_tag(&node.name).unwrap_or(node.name.as_str()).to_string()
    } else {
        node.name.clone()
    };

    let mut attrs = String::new();
    for prop in &node.properties {
        if prop.name == "text" {
            continue;
        }
        let name = rename_jsx_attr(&prop.name, opts);
        attrs.push_str(&format!(" {}=\"{}\"", name, escape_html(&prop.value)));
    }
    for binding in &node.bindings {
        if binding.name == "text" || binding.code.trim().is_empty() {
            continue;
        }
        let name = rename_jsx_attr(&binding.name, opts);
        if binding.is_event() {
            let params = binding.args.join(", ");
            attrs.push_str(&format!(" {}={{({}) => {{ {} }}}}", name, params, binding.code));
        } else {
            attrs.push_str(&format!(" {}={{{}}}", name, binding.code));
        }
    }

    let mut content = Vec::new();
    if let Some(text) = node.property("text") {
        content.push(format!("{}  {}", pad, text));
    }
    if let Some(binding) = node.binding("text") {
        content.push(format!("{}  {{{}}}", pad, binding.code));
    }
    if !node.children.is_empty() {
        content.push(render_jsx_children(&node.children, depth + 1, opts));
    }

    if content.is_empty() {
        format!("{}<{}{} />", pad, tag, attrs)
    } else {
        format!(
            "{pad}<{tag}{attrs}>\n{content}\n{pad}</{tag}>",
            pad = pad,
            tag = tag,
            attrs = attrs,
            content = content.join("\n")
        )
    }
}

fn rename_jsx_attr(name: &str, opts: &JsxOptions) -> String {
    if name == "class" {
        opts.class_attr.to_string()
    } else {
        name.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VUE
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_vue(component: &Component, layout: &StateLayout, options: &GenerateOptions) -> TargetOutput {
    let mut script = String::new();

    if !component.props.is_empty() {
        if options.typescript {
            let fields = component
                .props
                .iter()
                .map(|p| format!("{}?: {}", p.name, p.type_annotation.as_deref().unwrap_or("any")))
                .collect::<Vec<_>>()
                .join("; ");
            script.push_str(&format!("const props = defineProps<{{ {} }}>();\n\n", fields));
        } else {
            let names = component
                .prop_names()
                .iter()
                .map(|n| format!("\"{}\"", n))
                .collect::<Vec<_>>()
                .join(", ");
            script.push_str(&format!("const props = defineProps([{}]);\n\n", names));
        }
    }

    let slots = layout.store_slots();
    if !slots.is_empty() {
        script.push_str(&format!(
            "const state = reactive({{\n{}\n}});\n\n",
            render_store_slots(layout, "")
        ));
    }

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body } => {
                script.push_str(&format!(
                    "function {}() {{\n{}\n}}\n\n",
                    key,
                    indent_block(body, "  ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                script.push_str(&format!("{}\n\n", code));
            }
            _ => {}
        }
    }

    if let Some(init) = component.hook_code(HookKind::Init) {
        script.push_str(&format!("{}\n\n", init));
    }
    if let Some(mount) = component.hook_code(HookKind::Mount) {
        script.push_str(&format!(
            "onMounted(() => {{\n{}\n}});\n\n",
            indent_block(mount, "  ")
        ));
    }
    if let Some(update) = component.hook_code(HookKind::Update) {
        script.push_str(&format!(
            "onUpdated(() => {{\n{}\n}});\n\n",
            indent_block(update, "  ")
        ));
    }
    if let Some(unmount) = component.hook_code(HookKind::Unmount) {
        script.push_str(&format!(
            "onUnmounted(() => {{\n{}\n}});\n\n",
            indent_block(unmount, "  ")
        ));
    }

    let mut imports = ImportSet::default();
    if script.contains("reactive(") {
        imports.add_named("vue", "reactive");
    }
    for hook in ["onMounted", "onUpdated", "onUnmounted"] {
        if script.contains(&format!("{}(", hook)) {
            imports.add_named("vue", hook);
        }
    }
    imports.extend_component(&component.imports);

    let template = render_vue_children(&component.nodes, 1);

    let (rendered_imports, entries) = imports.into_parts();
    let lang = if options.typescript { " lang=\"ts\"" } else { "" };
    let source = format!(
        "<script setup{}>\n{}{}</script>\n\n<template>\n{}\n</template>\n",
        lang,
        if rendered_imports.is_empty() {
            String::new()
        } else {
            format!("{}\n", rendered_imports)
        },
        script,
        template
    );

    TargetOutput {
        source,
        imports: entries,
    }
}

fn render_vue_children(nodes: &[Node], depth: usize) -> String {
    nodes
        .iter()
        .map(|n| render_vue_node(n, depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_vue_node(node: &Node, depth: usize) -> String {
    let pad = "  ".repeat(depth);

    if let Some(repeat) = &node.repeat {
        let iter = match &repeat.index {
            Some(index) => format!("({}, {}) in {}", repeat.item, index, repeat.source),
            None => format!("{} in {}", repeat.item, repeat.source),
        };
        // Keyed when the first child carries an identity key; positional
        // otherwise.
        let key_attr = match repeat_key_code(node) {
            Some(key) => format!(" :key=\"{}\"", escape_attr_code(&key)),
            None => String::new(),
        };
        let children: Vec<Node> = node.children.iter().map(without_key_binding).collect();
        let inner = render_vue_children(&children, depth + 1);
        return format!(
            "{pad}<template v-for=\"{iter}\"{key}>\n{inner}\n{pad}</template>",
            pad = pad,
            iter = escape_attr_code(&iter),
            key = key_attr,
            inner = inner
        );
    }

    if node.name.is_empty() {
        if let Some(binding) = node.binding("text") {
            return format!("{}{{{{ {} }}}}", pad, binding.code);
        }
        if let Some(text) = node.property("text") {
            return format!("{}{}", pad, text);
        }
        return String::new();
    }

    let mut attrs = String::new();
    for prop in &node.properties {
        if prop.name == "text" {
            continue;
        }
        attrs.push_str(&format!(" {}=\"{}\"", prop.name, escape_html(&prop.value)));
    }
    for binding in &node.bindings {
        if binding.name == "text" {
            continue;
        }
        if binding.is_event() {
            let event = binding.name.trim_start_matches("on").to_lowercase();
            attrs.push_str(&format!(" @{}=\"{}\"", event, escape_attr_code(&binding.code)));
        } else {
            attrs.push_str(&format!(
                " :{}=\"{}\"",
                binding.name,
                escape_attr_code(&binding.code)
            ));
        }
    }

    let mut content = Vec::new();
    if let Some(text) = node.property("text") {
        content.push(format!("{}  {}", pad, text));
    }
    if let Some(binding) = node.binding("text") {
        content.push(format!("{}  {{{{ {} }}}}", pad, binding.code));
    }
    if !node.children.is_empty() {
        content.push(render_vue_children(&node.children, depth + 1));
    }

    if content.is_empty() {
        format!("{}<{}{} />", pad, node.name, attrs)
    } else {
        format!(
            "{pad}<{tag}{attrs}>\n{content}\n{pad}</{tag}>",
            pad = pad,
            tag = node.name,
            attrs = attrs,
            content = content.join("\n")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SVELTE
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_svelte(component: &Component, layout: &StateLayout, options: &GenerateOptions) -> TargetOutput {
    let mut script = String::new();

    for prop in &component.props {
        if options.typescript {
            script.push_str(&format!(
                "  export let {}: {};\n",
                prop.name,
                prop.type_annotation.as_deref().unwrap_or("any")
            ));
        } else {
            script.push_str(&format!("  export let {};\n", prop.name));
        }
    }
    if !component.props.is_empty() {
        script.push('\n');
    }

    for entry in &layout.entries {
        if let MaterializedEntry::PlainVariable {
            key,
            init,
            type_annotation,
        } = entry
        {
            let init = if init.trim().is_empty() {
                "undefined"
            } else {
                init.as_str()
            };
            match type_annotation {
                Some(ty) if options.typescript => {
                    script.push_str(&format!("  let {}: {} = {};\n", key, ty, init));
                }
                _ => script.push_str(&format!("  let {} = {};\n", key, init)),
            }
        }
    }
    script.push('\n');

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body } => {
                script.push_str(&format!(
                    "  function {}() {{\n{}\n  }}\n\n",
                    key,
                    indent_block(body, "    ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                script.push_str(&format!("{}\n\n", indent_block(code, "  ")));
            }
            _ => {}
        }
    }

    if let Some(init) = component.hook_code(HookKind::Init) {
        script.push_str(&format!("{}\n\n", indent_block(init, "  ")));
    }
    if let Some(mount) = component.hook_code(HookKind::Mount) {
        script.push_str(&format!(
            "  onMount(() => {{\n{}\n  }});\n\n",
            indent_block(mount, "    ")
        ));
    }
    if let Some(update) = component.hook_code(HookKind::Update) {
        script.push_str(&format!(
            "  afterUpdate(() => {{\n{}\n  }});\n\n",
            indent_block(update, "    ")
        ));
    }
    if let Some(unmount) = component.hook_code(HookKind::Unmount) {
        script.push_str(&format!(
            "  onDestroy(() => {{\n{}\n  }});\n\n",
            indent_block(unmount, "    ")
        ));
    }

    let mut imports = ImportSet::default();
    for hook in ["onMount", "afterUpdate", "onDestroy"] {
        if script.contains(&format!("{}(", hook)) {
            imports.add_named("svelte", hook);
        }
    }
    imports.extend_component(&component.imports);

    let markup = render_svelte_children(&component.nodes, 0);

    let (rendered_imports, entries) = imports.into_parts();
    let lang = if options.typescript { " lang=\"ts\"" } else { "" };
    let source = format!(
        "<script{}>\n{}{}</script>\n\n{}\n",
        lang,
        if rendered_imports.is_empty() {
            String::new()
        } else {
            format!("{}\n", indent_block(&rendered_imports, "  "))
        },
        script,
        markup
    );

    TargetOutput {
        source,
        imports: entries,
    }
}

fn render_svelte_children(nodes: &[Node], depth: usize) -> String {
    nodes
        .iter()
        .map(|n| render_svelte_node(n, depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_svelte_node(node: &Node, depth: usize) -> String {
    let pad = "  ".repeat(depth);

    if let Some(repeat) = &node.repeat {
        let mut head = format!("{} as {}", repeat.source, repeat.item);
        if let Some(index) = &repeat.index {
            head.push_str(&format!(", {}", index));
        }
        // The keyed form preserves item identity across re-renders; the
        // positional form is used when no identity key is supplied.
        if let Some(key) = repeat_key_code(node) {
            head.push_str(&format!(" ({})", key));
        }
        let children: Vec<Node> = node.children.iter().map(without_key_binding).collect();
        let inner = render_svelte_children(&children, depth + 1);
        return format!(
            "{pad}{{#each {head}}}\n{inner}\n{pad}{{/each}}",
            pad = pad,
            head = head,
            inner = inner
        );
    }

    if node.name.is_empty() {
        if let Some(binding) = node.binding("text") {
            return format!("{}{{{}}}", pad, binding.code);
        }
        if let Some(text) = node.property("text") {
            return format!("{}{}", pad, text);
        }
        return String::new();
    }

    let mut attrs = String::new();
    for prop in &node.properties {
        if prop.name == "text" {
            continue;
        }
        attrs.push_str(&format!(" {}=\"{}\"", prop.name, escape_html(&prop.value)));
    }
    for binding in &node.bindings {
        if binding.name == "text" {
            continue;
        }
        if binding.is_event() {
            let event = binding.name.trim_start_matches("on").to_lowercase();
            let params = binding.args.join(", ");
            attrs.push_str(&format!(
                " on:{}={{({}) => {{ {} }}}}",
                event, params, binding.code
            ));
        } else {
            attrs.push_str(&format!(" {}={{{}}}", binding.name, binding.code));
        }
    }

    let mut content = Vec::new();
    if let Some(text) = node.property("text") {
        content.push(format!("{}  {}", pad, text));
    }
    if let Some(binding) = node.binding("text") {
        content.push(format!("{}  {{{}}}", pad, binding.code));
    }
    if !node.children.is_empty() {
        content.push(render_svelte_children(&node.children, depth + 1));
    }

    if content.is_empty() {
        format!("{}<{}{} />", pad, node.name, attrs)
    } else {
        format!(
            "{pad}<{tag}{attrs}>\n{content}\n{pad}</{tag}>",
            pad = pad,
            tag = node.name,
            attrs = attrs,
            content = content.join("\n")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANGULAR
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_angular(component: &Component, layout: &StateLayout, options: &GenerateOptions) -> TargetOutput {
    let mut members = String::new();

    for prop in &component.props {
        if options.typescript {
            members.push_str(&format!(
                "  @Input() {}: {};\n",
                prop.name,
                prop.type_annotation.as_deref().unwrap_or("any")
            ));
        } else {
            members.push_str(&format!("  @Input() {};\n", prop.name));
        }
    }
    if !component.props.is_empty() {
        members.push('\n');
    }

    for entry in &layout.entries {
        if let MaterializedEntry::StoreSlot { key, init } = entry {
            let init = if init.trim().is_empty() {
                "undefined"
            } else {
                init.as_str()
            };
            let annotation = component
                .state_entry(key)
                .and_then(|e| e.type_annotation.clone());
            match annotation {
                Some(ty) if options.typescript => {
                    members.push_str(&format!("  {}: {} = {};\n", key, ty, init));
                }
                _ => members.push_str(&format!("  {} = {};\n", key, init)),
            }
        }
    }
    members.push('\n');

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body } => {
                members.push_str(&format!(
                    "  {}() {{\n{}\n  }}\n\n",
                    key,
                    indent_block(body, "    ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                members.push_str(&format!(
                    "{}\n\n",
                    indent_block(&as_class_method(code), "  ")
                ));
            }
            _ => {}
        }
    }

    let hook_methods = [
        (HookKind::Init, "ngOnInit"),
        (HookKind::Mount, "ngAfterViewInit"),
        (HookKind::Update, "ngDoCheck"),
        (HookKind::Unmount, "ngOnDestroy"),
    ];
    for (kind, method) in hook_methods {
        if let Some(code) = component.hook_code(kind) {
            members.push_str(&format!(
                "  {}() {{\n{}\n  }}\n\n",
                method,
                indent_block(code, "    ")
            ));
        }
    }

    let template = render_angular_children(&component.nodes, 2);

    let mut imports = ImportSet::default();
    imports.add_named("@angular/core", "Component");
    if !component.props.is_empty() {
        imports.add_named("@angular/core", "Input");
    }
    imports.extend_component(&component.imports);

    let (rendered_imports, entries) = imports.into_parts();
    let source = format!(
        "{}\n@Component({{\n  selector: \"{}\",\n  template: `\n{}\n  `,\n}})\nexport default class {} {{\n{}}}\n",
        rendered_imports,
        kebab_case(&component.name),
        template,
        component.name,
        members
    );

    TargetOutput {
        source,
        imports: entries,
    }
}

/// Class bodies take `name() {}` members, not `function name() {}`.
fn as_class_method(code: &str) -> String {
    code.trim_start()
        .strip_prefix("function ")
        .unwrap_or(code)
        .to_string()
}

fn render_angular_children(nodes: &[Node], depth: usize) -> String {
    nodes
        .iter()
        .map(|n| render_angular_node(n, depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_angular_node(node: &Node, depth: usize) -> String {
    let pad = "  ".repeat(depth);

    if let Some(repeat) = &node.repeat {
        // Rendering is positional regardless of the identity key: trackBy
        // requires a component method, which this emitter does not
        // synthesize.
        let mut for_expr = format!("let {} of {}", repeat.item, repeat.source);
        if let Some(index) = &repeat.index {
            for_expr.push_str(&format!("; index as {}", index));
        }
        let children: Vec<Node> = node.children.iter().map(without_key_binding).collect();
        let inner = render_angular_children(&children, depth + 1);
        return format!(
            "{pad}<ng-container *ngFor=\"{expr}\">\n{inner}\n{pad}</ng-container>",
            pad = pad,
            expr = escape_attr_code(&for_expr),
            inner = inner
        );
    }

    if node.name.is_empty() {
        if let Some(binding) = node.binding("text") {
            return format!("{}{{{{ {} }}}}", pad, binding.code);
        }
        if let Some(text) = node.property("text") {
            return format!("{}{}", pad, text);
        }
        return String::new();
    }

    let mut attrs = String::new();
    for prop in &node.properties {
        if prop.name == "text" {
            continue;
        }
        attrs.push_str(&format!(" {}=\"{}\"", prop.name, escape_html(&prop.value)));
    }
    for binding in &node.bindings {
        if binding.name == "text" {
            continue;
        }
        if binding.is_event() {
            let event = binding.name.trim_start_matches("on").to_lowercase();
            attrs.push_str(&format!(
                " ({})=\"{}\"",
                event,
                escape_attr_code(&binding.code)
            ));
        } else {
            attrs.push_str(&format!(
                " [{}]=\"{}\"",
                binding.name,
                escape_attr_code(&binding.code)
            ));
        }
    }

    let mut content = Vec::new();
    if let Some(text) = node.property("text") {
        content.push(format!("{}  {}", pad, text));
    }
    if let Some(binding) = node.binding("text") {
        content.push(format!("{}  {{{{ {} }}}}", pad, binding.code));
    }
    if !node.children.is_empty() {
        content.push(render_angular_children(&node.children, depth + 1));
    }

    if content.is_empty() {
        format!("{}<{}{}></{}>", pad, node.name, attrs, node.name)
    } else {
        format!(
            "{pad}<{tag}{attrs}>\n{content}\n{pad}</{tag}>",
            pad = pad,
            tag = node.name,
            attrs = attrs,
            content = content.join("\n")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALPINE
// ═══════════════════════════════════════════════════════════════════════════════

fn emit_alpine(component: &Component, layout: &StateLayout) -> TargetOutput {
    let mut members = String::new();

    for (key, init) in layout.store_slots() {
        let init = if init.trim().is_empty() { "undefined" } else { init };
        members.push_str(&format!("    {}: {},\n", key, init));
    }
    if !layout.store_slots().is_empty() {
        members.push('\n');
    }

    for entry in &layout.entries {
        match entry {
            MaterializedEntry::Accessor { key, body } => {
                members.push_str(&format!(
                    "    {}() {{\n{}\n    }},\n\n",
                    key,
                    indent_block(body, "      ")
                ));
            }
            MaterializedEntry::Method { code, .. } | MaterializedEntry::Helper { code, .. } => {
                members.push_str(&format!(
                    "{},\n\n",
                    indent_block(&as_class_method(code), "    ")
                ));
            }
            _ => {}
        }
    }

    // Alpine's own lifecycle: init() before the component renders,
    // destroy() on teardown. Mount code joins init; update has no mapping
    // and is skipped.
    let init = component.hook_code(HookKind::Init).unwrap_or("");
    let mount = component.hook_code(HookKind::Mount).unwrap_or("");
    if !init.is_empty() || !mount.is_empty() {
        let mut code = String::new();
        if !init.is_empty() {
            code.push_str(init);
        }
        if !mount.is_empty() {
            if !code.is_empty() {
                code.push('\n');
            }
            code.push_str(mount);
        }
        members.push_str(&format!(
            "    init() {{\n{}\n    }},\n\n",
            indent_block(&code, "      ")
        ));
    }
    if let Some(unmount) = component.hook_code(HookKind::Unmount) {
        members.push_str(&format!(
            "    destroy() {{\n{}\n    }},\n\n",
            indent_block(unmount, "      ")
        ));
    }

    let markup = render_alpine_children(&component.nodes, 1);

    let mut imports = ImportSet::default();
    imports.add_default("alpinejs", "Alpine");
    imports.extend_component(&component.imports);
    let (rendered_imports, entries) = imports.into_parts();

    let source = format!(
        "<script type=\"module\">\n{}\n  Alpine.data(\"{}\", () => ({{\n{}  }}));\n</script>\n\n<div x-data=\"{}\">\n{}\n</div>\n",
        indent_block(&rendered_imports, "  "),
        component.name,
        members,
        component.name,
        markup
    );

    TargetOutput {
        source,
        imports: entries,
    }
}

fn render_alpine_children(nodes: &[Node], depth: usize) -> String {
    nodes
        .iter()
        .map(|n| render_alpine_node(n, depth))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_alpine_node(node: &Node, depth: usize) -> String {
    let pad = "  ".repeat(depth);

    if let Some(repeat) = &node.repeat {
        let iter = match &repeat.index {
            Some(index) => format!("({}, {}) in {}", repeat.item, index, repeat.source),
            None => format!("{} in {}", repeat.item, repeat.source),
        };
        let key_attr = match repeat_key_code(node) {
            Some(key) => format!(" :key=\"{}\"", escape_attr_code(&key)),
            None => String::new(),
        };
        let children: Vec<Node> = node.children.iter().map(without_key_binding).collect();
        let inner = render_alpine_children(&children, depth + 1);
        return format!(
            "{pad}<template x-for=\"{iter}\"{key}>\n{inner}\n{pad}</template>",
            pad = pad,
            iter = escape_attr_code(&iter),
            key = key_attr,
            inner = inner
        );
    }

    if node.name.is_empty() {
        if let Some(binding) = node.binding("text") {
            return format!(
                "{}<span x-text=\"{}\"></span>",
                pad,
                escape_attr_code(&binding.code)
            );
        }
        if let Some(text) = node.property("text") {
            return format!("{}{}", pad, text);
        }
        return String::new();
    }

    let mut attrs = String::new();
    for prop in &node.properties {
        if prop.name == "text" {
            continue;
        }
        attrs.push_str(&format!(" {}=\"{}\"", prop.name, escape_html(&prop.value)));
    }
    for binding in &node.bindings {
        if binding.name == "text" {
            continue;
        }
        if binding.is_event() {
            let event = binding.name.trim_start_matches("on").to_lowercase();
            attrs.push_str(&format!(
                " x-on:{}=\"{}\"",
                event,
                escape_attr_code(&binding.code)
            ));
        } else {
            attrs.push_str(&format!(
                " :{}=\"{}\"",
                binding.name,
                escape_attr_code(&binding.code)
            ));
        }
    }
    // Interpolated text rides on the element itself.
    if let Some(binding) = node.binding("text") {
        attrs.push_str(&format!(" x-text=\"{}\"", escape_attr_code(&binding.code)));
    }

    let mut content = Vec::new();
    if let Some(text) = node.property("text") {
        content.push(format!("{}  {}", pad, text));
    }
    if !node.children.is_empty() {
        content.push(render_alpine_children(&node.children, depth + 1));
    }

    if content.is_empty() {
        format!("{}<{}{}></{}>", pad, node.name, attrs, node.name)
    } else {
        format!(
            "{pad}<{tag}{attrs}>\n{content}\n{pad}</{tag}>",
            pad = pad,
            tag = node.name,
            attrs = attrs,
            content = content.join("\n")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

fn render_store_slots(layout: &StateLayout, pad: &str) -> String {
    layout
        .store_slots()
        .iter()
        .map(|(key, init)| {
            let init = if init.trim().is_empty() { "undefined" } else { init };
            format!("{}  {}: {},", pad, key, init)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BindingEntry, StateEntry};
    use crate::materialize::materialize;

    fn counter() -> Component {
        let mut c = Component {
            name: "Counter".to_string(),
            state: vec![StateEntry::value("count", "0")],
            ..Default::default()
        };
        let mut button = Node::element("button");
        button
            .bindings
            .push(BindingEntry::handler("onClick", "count = count + 1;", &[]));
        button.children.push(Node::text("Add"));
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "count"));
        c.nodes.push(button);
        c.nodes.push(span);
        c
    }

    #[test]
    fn test_react_imports_are_usage_scanned() {
        let mut c = counter();
        let layout = materialize(&mut c, Flavor::IndependentPairs, "state");
        let out = emit_react(&c, &layout, &GenerateOptions::default());
        assert!(out.source.contains("import { useState } from \"react\";"));
        assert!(!out.source.contains("useEffect"));
        assert_eq!(out.imports.len(), 1);
    }

    #[test]
    fn test_react_pair_declaration_is_lazy() {
        let mut c = counter();
        let layout = materialize(&mut c, Flavor::IndependentPairs, "state");
        let out = emit_react(&c, &layout, &GenerateOptions::default());
        assert!(
            out.source
                .contains("const [count, setCount] = useState(() => (0));"),
            "got:\n{}",
            out.source
        );
    }

    #[test]
    fn test_react_class_attribute_is_renamed() {
        let mut c = counter();
        c.nodes[0]
            .bindings
            .push(BindingEntry::new("class", "buttonStyle"));
        let layout = materialize(&mut c, Flavor::IndependentPairs, "state");
        let out = emit_react(&c, &layout, &GenerateOptions::default());
        assert!(out.source.contains("className={buttonStyle}"));
    }

    #[test]
    fn test_solid_store_declaration() {
        let mut c = counter();
        let layout = materialize(&mut c, Flavor::ProxyStore, "state");
        let out = emit_solid(&c, &layout, &GenerateOptions::default());
        assert!(out.source.contains("const state = createMutable({"));
        assert!(out.source.contains("count: 0,"));
        assert!(out
            .source
            .contains("import { createMutable } from \"solid-js/store\";"));
    }

    #[test]
    fn test_vue_keyed_repeat() {
        let mut c = Component {
            name: "List".to_string(),
            state: vec![StateEntry::value("items", "[]")],
            ..Default::default()
        };
        let mut li = Node::element("li");
        li.bindings.push(BindingEntry::new("key", "item.id"));
        li.bindings.push(BindingEntry::new("text", "item.label"));
        let mut container = Node::default();
        container.repeat = Some(crate::component::Repeat {
            source: "items".to_string(),
            item: "item".to_string(),
            index: None,
        });
        container.children.push(li);
        c.nodes.push(container);

        let layout = materialize(&mut c, Flavor::ReactiveMutable, "state");
        let out = emit_vue(&c, &layout, &GenerateOptions::default());
        assert!(
            out.source
                .contains("<template v-for=\"item in state.items\" :key=\"item.id\">"),
            "got:\n{}",
            out.source
        );
        // The key binding must not leak onto the element itself.
        assert!(!out.source.contains(":key=\"item.id\">\n      <li :key"));
    }

    #[test]
    fn test_svelte_positional_each_without_key() {
        let mut c = Component {
            name: "List".to_string(),
            state: vec![StateEntry::value("items", "[]")],
            ..Default::default()
        };
        let mut li = Node::element("li");
        li.bindings.push(BindingEntry::new("text", "item"));
        let mut container = Node::default();
        container.repeat = Some(crate::component::Repeat {
            source: "items".to_string(),
            item: "item".to_string(),
            index: Some("i".to_string()),
        });
        container.children.push(li);
        c.nodes.push(container);

        let layout = materialize(&mut c, Flavor::PlainVariables, "state");
        let out = emit_svelte(&c, &layout, &GenerateOptions::default());
        assert!(
            out.source.contains("{#each items as item, i}"),
            "got:\n{}",
            out.source
        );
    }

    #[test]
    fn test_angular_class_members_and_selector() {
        let mut c = counter();
        c.name = "MyCounter".to_string();
        c.props.push(crate::component::PropDef::new("label"));
        let layout = materialize(&mut c, Flavor::ObservableStore, "this");
        let out = emit_angular(&c, &layout, &GenerateOptions::default());
        assert!(out.source.contains("selector: \"my-counter\""));
        assert!(out.source.contains("@Input() label;"));
        assert!(out.source.contains("count = 0;"));
        assert!(out
            .source
            .contains("import { Component, Input } from \"@angular/core\";"));
    }

    #[test]
    fn test_alpine_data_module() {
        let mut c = counter();
        let layout = materialize(&mut c, Flavor::ExternalStore, "this");
        let out = emit_alpine(&c, &layout);
        assert!(out.source.contains("Alpine.data(\"Counter\", () => ({"));
        assert!(out.source.contains("count: 0,"));
        assert!(out.source.contains("x-data=\"Counter\""));
        assert!(out.source.contains("import Alpine from \"alpinejs\";"));
    }

    #[test]
    fn test_import_rendering_shapes() {
        assert_eq!(
            render_import(&ImportEntry::named("react", &["useState", "useEffect"])),
            "import { useState, useEffect } from \"react\";"
        );
        assert_eq!(
            render_import(&ImportEntry::default_import("alpinejs", "Alpine")),
            "import Alpine from \"alpinejs\";"
        );
        let side_effect = ImportEntry {
            source: "./styles.css".to_string(),
            specifiers: vec![],
            default_specifier: None,
        };
        assert_eq!(render_import(&side_effect), "import \"./styles.css\";");
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("MyComponent"), "my-component");
        assert_eq!(kebab_case("Counter"), "counter");
    }
}
