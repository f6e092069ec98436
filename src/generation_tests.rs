//! End-to-end properties of the generation pipeline: relocation ordering,
//! setter form, flavor pass-through, getter materialization, and isolation
//! across targets.

#[cfg(test)]
mod tests {
    use crate::codegen::{GenerateOptions, Target};
    use crate::component::{BindingEntry, Component, ContextRef, Node, PropDef, StateEntry};
    use crate::materialize::Flavor;
    use crate::pipeline::{compile_component, generate_target, TargetRequest};
    use crate::validate::ERR_SETTER_COLLISION;

    fn generate(component: &Component, target: Target) -> String {
        generate_target(component, target, &GenerateOptions::default())
            .unwrap()
            .source
    }

    /// A component exercising relocation, setters, getters and repetition.
    fn dashboard() -> Component {
        let mut c = Component {
            name: "Dashboard".to_string(),
            props: vec![PropDef::new("start")],
            state: vec![
                StateEntry::value("count", "0"),
                StateEntry::value("doubled", "count * 2"),
                StateEntry::getter("shout", "return this.count.toString();"),
            ],
            ..Default::default()
        };
        let mut button = Node::element("button");
        button
            .bindings
            .push(BindingEntry::handler("onClick", "count = count + 1;", &[]));
        button.children.push(Node::text("Add"));
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "shout"));
        c.nodes.push(button);
        c.nodes.push(span);
        c
    }

    #[test]
    fn test_react_setter_form_and_relocation() {
        let source = generate(&dashboard(), Target::React);

        // Handler mutation became a setter call with the RHS verbatim.
        assert!(
            source.contains("setCount(count + 1);"),
            "got:\n{}",
            source
        );
        // The dependent initializer moved into the init effect, in setter
        // form, references stripped to bare pair bindings.
        assert!(source.contains("setDoubled(count * 2);"), "got:\n{}", source);
        assert!(source.contains("const [doubled, setDoubled] = useState(() => (null));"));
    }

    #[test]
    fn test_relocation_order_survives_to_emitted_source() {
        let mut c = Component {
            name: "Chain".to_string(),
            state: vec![
                StateEntry::value("a", "1"),
                StateEntry::value("b", "a + 1"),
                StateEntry::value("c", "b + a"),
            ],
            ..Default::default()
        };
        c.nodes.push(Node::text("ok"));

        let source = generate(&c, Target::React);
        let b_at = source.find("setB(a + 1);").expect("b must be assigned");
        let c_at = source.find("setC(b + a);").expect("c must be assigned");
        assert!(b_at < c_at, "b must initialize before c:\n{}", source);
    }

    #[test]
    fn test_store_flavors_keep_assignments_and_receiver() {
        let source = generate(&dashboard(), Target::Vue);

        // Pass-through: no setter call anywhere, mutation left as an
        // assignment against the shared receiver.
        assert!(!source.contains("setCount("));
        assert!(
            source.contains("@click=\"state.count = state.count + 1;\""),
            "got:\n{}",
            source
        );
        assert!(source.contains("state.doubled = state.count * 2;"));
    }

    #[test]
    fn test_getter_materializes_as_invoked_function() {
        let source = generate(&dashboard(), Target::React);
        assert!(source.contains("function shout() {"));
        assert!(source.contains("return count.toString();"));
        // The template reference became an invocation.
        assert!(source.contains("{shout()}"), "got:\n{}", source);
    }

    #[test]
    fn test_generation_for_one_target_never_leaks_into_another() {
        let c = dashboard();
        let vue_fresh = generate(&c, Target::Vue);
        let _react = generate(&c, Target::React);
        let vue_again = generate(&c, Target::Vue);

        assert_eq!(
            vue_fresh, vue_again,
            "vue output must be unaffected by the react run"
        );
        // And the react-only rewrites must not appear in vue output.
        assert!(!vue_again.contains("setDoubled("));
    }

    #[test]
    fn test_end_to_end_pair_example() {
        let mut c = Component {
            name: "Greeter".to_string(),
            state: vec![
                StateEntry::value("name", "\"raw\""),
                StateEntry::getter("shout", "return this.name.toUpperCase();"),
            ],
            ..Default::default()
        };
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "shout"));
        c.nodes.push(span);

        let source = generate(&c, Target::React);

        assert!(
            source.contains("const [name, setName] = useState(() => (\"raw\"));"),
            "got:\n{}",
            source
        );
        assert!(source.contains("function shout() {"));
        assert!(source.contains("return name.toUpperCase();"));
        // A getter is not a value: nothing to relocate, so no init effect.
        assert!(!source.contains("useEffect"));
    }

    #[test]
    fn test_setter_collision_is_fatal_per_target() {
        let c = Component {
            name: "Clash".to_string(),
            state: vec![
                StateEntry::value("count", "0"),
                StateEntry::value("setCount", "null"),
            ],
            ..Default::default()
        };
        let requests = [
            TargetRequest::new(Target::React),
            TargetRequest::new(Target::Svelte),
        ];
        let results = compile_component(&c, &requests);

        let err = results[0].result.as_ref().expect_err("react must fail");
        assert_eq!(err.code, ERR_SETTER_COLLISION);
        assert!(results[1].result.is_ok(), "svelte is unaffected");
    }

    #[test]
    fn test_typed_output_mode() {
        let mut c = Component {
            name: "Typed".to_string(),
            props: vec![PropDef {
                name: "label".to_string(),
                type_annotation: Some("string".to_string()),
            }],
            state: vec![StateEntry::value("count", "0")],
            ..Default::default()
        };
        c.state[0].type_annotation = Some("number".to_string());
        c.nodes.push(Node::text("ok"));

        let options = GenerateOptions {
            typescript: true,
            ..Default::default()
        };
        let source = generate_target(&c, Target::React, &options).unwrap().source;
        assert!(source.contains("export interface TypedProps {"));
        assert!(source.contains("label?: string;"));
        assert!(source.contains("useState<number>(() => (0));"));
    }

    #[test]
    fn test_native_rendering_mode() {
        let mut c = Component {
            name: "Card".to_string(),
            state: vec![StateEntry::value("title", "\"hi\"")],
            ..Default::default()
        };
        let mut div = Node::element("div");
        let mut span = Node::element("span");
        span.bindings.push(BindingEntry::new("text", "title"));
        div.children.push(span);
        c.nodes.push(div);

        let options = GenerateOptions {
            native: true,
            ..Default::default()
        };
        let source = generate_target(&c, Target::React, &options).unwrap().source;
        assert!(source.contains("<View>"), "got:\n{}", source);
        assert!(source.contains("<Text"), "got:\n{}", source);
        assert!(source.contains("import { View, Text } from \"react-native\";"));
    }

    #[test]
    fn test_react_accepts_the_observable_store_flavor() {
        let options = GenerateOptions {
            flavor: Some(Flavor::ObservableStore),
            ..Default::default()
        };
        let source = generate_target(&dashboard(), Target::React, &options)
            .unwrap()
            .source;

        assert!(
            source.contains("const state = useLocalObservable(() => ({"),
            "got:\n{}",
            source
        );
        assert!(source.contains("import { useLocalObservable } from \"mobx-react-lite\";"));
        // Observable stores mutate in place; no setter form anywhere.
        assert!(!source.contains("setCount("));
        assert!(source.contains("state.count = state.count + 1;"));
    }

    #[test]
    fn test_react_context_consumption() {
        let mut c = dashboard();
        c.context.push(ContextRef {
            name: "theme".to_string(),
            source: "./theme-context".to_string(),
        });
        let source = generate(&c, Target::React);
        assert!(source.contains("const theme = useContext(ThemeContext);"));
        assert!(source.contains("import ThemeContext from \"./theme-context\";"));
        assert!(source.contains("import { useState, useEffect, useContext } from \"react\";"));
    }

    #[test]
    fn test_every_target_generates_the_dashboard() {
        let c = dashboard();
        for target in [
            Target::React,
            Target::Solid,
            Target::Vue,
            Target::Svelte,
            Target::Angular,
            Target::Alpine,
        ] {
            let result = generate_target(&c, target, &GenerateOptions::default());
            let output = result.unwrap_or_else(|e| panic!("{} failed: {}", target.name(), e));
            assert!(
                !output.source.trim().is_empty(),
                "{} emitted nothing",
                target.name()
            );
        }
    }
}
