//! # Refract Compiler Core
//!
//! One declarative component in, equivalent source for many UI frameworks
//! out. The crate owns the state-reference normalization and
//! code-generation pipeline; parsing the component source into the IR and
//! writing files back out belong to the callers.
//!
//! ## Pipeline Invariants
//!
//! 1. **Copy Isolation**: the parsed `Component` is shared read-only. Every
//!    target generation starts from its own deep copy; no pass ever mutates
//!    the shared original. Failures are scoped to one copy.
//!
//! 2. **Relocation Order**: initializers that reference sibling state or
//!    props move into the init hook. Entries are visited in reverse
//!    declaration order and prepended, so the hook executes in original
//!    declaration order. The pass is idempotent.
//!
//! 3. **Receiver Qualification**: relocated code uses the unified receiver
//!    form (`state.x` / `props.x`). Materialization restyles every carried
//!    fragment to the flavor's reference convention: bare identifiers for
//!    pair and plain-variable flavors, a shared receiver for store flavors,
//!    invocations for getter references.
//!
//! 4. **Setter Form**: only the independent-pairs flavor rewrites direct
//!    state mutation, and only plain `=` assignments whose left side is the
//!    field itself. The right-hand side is spliced verbatim.
//!
//! 5. **Best-Effort Output**: fragments the rewriter cannot parse, and
//!    constructs no pass supports, flow through untouched. No scope chain
//!    is kept: a local shadowing a state field is rewritten like the field.
//!
//! 6. **Closed Target Set**: targets and flavors are tagged unions. Adding
//!    a target is a new variant plus a new emitter, checked exhaustively at
//!    compile time.

mod codegen;
mod component;
mod materialize;
mod pipeline;
mod rewrite;
mod transform;
mod validate;

pub use codegen::{emit, GenerateOptions, Target, TargetOutput};
pub use component::{
    setter_name, BindingEntry, Component, ContextRef, HookEntry, HookKind, ImportEntry, Node,
    PropDef, Repeat, StateEntry, StateKind, StaticProperty,
};
pub use materialize::{
    materialize, reference_style, Flavor, MaterializedEntry, ReferenceStyle, StateLayout,
};
pub use pipeline::{
    compile_component, compile_component_json, generate_target, CompiledTarget, TargetReport,
    TargetRequest,
};
pub use transform::{
    relocate_state_references, rewrite_mutations_to_setters, RELOCATED_PLACEHOLDER,
};
pub use validate::{
    validate_state_keys, CompilerError, ERR_FLAVOR_UNSUPPORTED, ERR_INPUT_MALFORMED,
    ERR_RECEIVER_COLLISION, ERR_SETTER_COLLISION,
};

#[cfg(test)]
mod generation_tests;
