//! Per-target orchestration.
//!
//! One parsed component, N targets: every target generation begins with a
//! deep copy of the shared IR, runs the passes on that copy, and emits.
//! Copies make the targets read-only with respect to each other, so the
//! fan-out runs on rayon with no shared mutable state; one target's failure
//! never touches its siblings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codegen::{self, GenerateOptions, Target, TargetOutput};
use crate::component::Component;
use crate::materialize;
use crate::transform;
use crate::validate::{self, CompilerError, ERR_FLAVOR_UNSUPPORTED, ERR_INPUT_MALFORMED};

// ═══════════════════════════════════════════════════════════════════════════════
// REQUESTS AND RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub target: Target,
    #[serde(default)]
    pub options: GenerateOptions,
}

impl TargetRequest {
    pub fn new(target: Target) -> Self {
        TargetRequest {
            target,
            options: GenerateOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledTarget {
    pub target: Target,
    pub result: Result<TargetOutput, CompilerError>,
}

/// JSON projection of one target's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub target: Target,
    #[serde(default)]
    pub output: Option<TargetOutput>,
    #[serde(default)]
    pub error: Option<CompilerError>,
}

impl From<CompiledTarget> for TargetReport {
    fn from(compiled: CompiledTarget) -> Self {
        match compiled.result {
            Ok(output) => TargetReport {
                target: compiled.target,
                output: Some(output),
                error: None,
            },
            Err(error) => TargetReport {
                target: compiled.target,
                output: None,
                error: Some(error),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Generate one target from the shared parsed component. Takes its own deep
/// copy; the input is never mutated.
pub fn generate_target(
    component: &Component,
    target: Target,
    options: &GenerateOptions,
) -> Result<TargetOutput, CompilerError> {
    let flavor = options.flavor.unwrap_or_else(|| target.default_flavor());
    if !target.supports(flavor) {
        return Err(CompilerError::new(
            ERR_FLAVOR_UNSUPPORTED,
            &format!(
                "Target \"{}\" does not materialize the {:?} flavor.",
                target.name(),
                flavor
            ),
            &component.name,
        ));
    }

    let mut working = component.clone();
    transform::relocate_state_references(&mut working);
    transform::rewrite_mutations_to_setters(&mut working, flavor);
    validate::validate_state_keys(&working, flavor, target.receiver())?;
    let layout = materialize::materialize(&mut working, flavor, target.receiver());
    Ok(codegen::emit(target, &working, &layout, options))
}

/// Generate every requested target. Results come back in request order;
/// generation runs in parallel, one isolated IR copy per target.
pub fn compile_component(component: &Component, requests: &[TargetRequest]) -> Vec<CompiledTarget> {
    requests
        .par_iter()
        .map(|request| CompiledTarget {
            target: request.target,
            result: generate_target(component, request.target, &request.options),
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON BOUNDARY
// ═══════════════════════════════════════════════════════════════════════════════

/// String-in/string-out entry point: component IR JSON plus a request list,
/// returning per-target reports. Malformed input is the only failure that
/// aborts the whole call.
pub fn compile_component_json(
    ir_json: &str,
    requests_json: &str,
) -> Result<String, CompilerError> {
    let component: Component = serde_json::from_str(ir_json).map_err(|e| {
        CompilerError::new(
            ERR_INPUT_MALFORMED,
            &format!("Component IR parse error: {}", e),
            "<input>",
        )
    })?;
    let requests: Vec<TargetRequest> = serde_json::from_str(requests_json).map_err(|e| {
        CompilerError::new(
            ERR_INPUT_MALFORMED,
            &format!("Request list parse error: {}", e),
            &component.name,
        )
    })?;

    let reports: Vec<TargetReport> = compile_component(&component, &requests)
        .into_iter()
        .map(TargetReport::from)
        .collect();

    serde_json::to_string(&reports).map_err(|e| {
        CompilerError::new(
            ERR_INPUT_MALFORMED,
            &format!("Report serialize error: {}", e),
            &component.name,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::StateEntry;
    use crate::materialize::Flavor;

    fn component() -> Component {
        Component {
            name: "Widget".to_string(),
            state: vec![StateEntry::value("count", "0")],
            ..Default::default()
        }
    }

    #[test]
    fn test_input_component_is_never_mutated() {
        let c = component();
        let before = serde_json::to_string(&c).unwrap();
        let requests = [
            TargetRequest::new(Target::React),
            TargetRequest::new(Target::Vue),
            TargetRequest::new(Target::Svelte),
        ];
        let results = compile_component(&c, &requests);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert_eq!(serde_json::to_string(&c).unwrap(), before);
    }

    #[test]
    fn test_unsupported_flavor_fails_only_that_target() {
        let c = component();
        let mut bad = TargetRequest::new(Target::React);
        bad.options.flavor = Some(Flavor::PlainVariables);
        let requests = [bad, TargetRequest::new(Target::Svelte)];

        let results = compile_component(&c, &requests);
        let err = results[0].result.as_ref().expect_err("react must fail");
        assert_eq!(err.code, ERR_FLAVOR_UNSUPPORTED);
        assert!(results[1].result.is_ok(), "svelte must still generate");
    }

    #[test]
    fn test_results_keep_request_order() {
        let c = component();
        let requests = [
            TargetRequest::new(Target::Angular),
            TargetRequest::new(Target::React),
        ];
        let results = compile_component(&c, &requests);
        assert_eq!(results[0].target, Target::Angular);
        assert_eq!(results[1].target, Target::React);
    }

    #[test]
    fn test_json_boundary_round_trip() {
        let ir = r#"{
            "name": "Counter",
            "state": [{ "key": "count", "kind": "value", "code": "0" }]
        }"#;
        let requests = r#"[{ "target": "react" }]"#;

        let report_json = compile_component_json(ir, requests).unwrap();
        let reports: Vec<TargetReport> = serde_json::from_str(&report_json).unwrap();
        assert_eq!(reports.len(), 1);
        let output = reports[0].output.as_ref().unwrap();
        assert!(output.source.contains("const [count, setCount]"));

        // Building the same component in Rust generates identical source.
        let direct = generate_target(
            &component(),
            Target::React,
            &GenerateOptions::default(),
        )
        .unwrap();
        assert_eq!(
            direct.source.replace("Widget", "Counter"),
            output.source
        );
    }

    #[test]
    fn test_malformed_ir_is_rejected() {
        let err = compile_component_json("{ not json", "[]").expect_err("must fail");
        assert_eq!(err.code, ERR_INPUT_MALFORMED);
    }
}
