use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::component::{setter_name, Component};
use crate::materialize::Flavor;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_SETTER_COLLISION: &str = "R-ERR-STATE-001";
pub const ERR_RECEIVER_COLLISION: &str = "R-ERR-STATE-002";
pub const ERR_FLAVOR_UNSUPPORTED: &str = "R-ERR-TARGET-001";
pub const ERR_INPUT_MALFORMED: &str = "R-ERR-INPUT-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_SETTER_COLLISION => {
            "Generated setter names never collide with declared state keys."
        }
        ERR_RECEIVER_COLLISION => {
            "The shared state receiver is never shadowed by a state key."
        }
        ERR_FLAVOR_UNSUPPORTED => {
            "Every target generates with a materialization flavor it implements."
        }
        ERR_INPUT_MALFORMED => "The input boundary only accepts well-formed component IR.",
        _ => "Unknown guarantee.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// A per-target fatal error. Carries a stable code, the guarantee that code
/// stands for, and the offending component/key. Failures are scoped to one
/// target's working copy and never abort sibling generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub component: String,
    #[serde(default)]
    pub state_key: Option<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, component: &str) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            component: component.to_string(),
            state_key: None,
        }
    }

    pub fn with_key(code: &str, message: &str, component: &str, key: &str) -> Self {
        let mut err = Self::new(code, message, component);
        err.state_key = Some(key.to_string());
        err
    }
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.component, self.message)
    }
}

impl std::error::Error for CompilerError {}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE KEY VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Reject state keys that collide with identifiers the chosen flavor
/// reserves: generated setter names for the pair flavor, the shared receiver
/// for store flavors. Fatal for this target only.
pub fn validate_state_keys(
    component: &Component,
    flavor: Flavor,
    receiver: &str,
) -> Result<(), CompilerError> {
    let keys: HashSet<&str> = component.state.iter().map(|e| e.key.as_str()).collect();

    match flavor {
        Flavor::IndependentPairs => {
            for entry in &component.state {
                let setter = setter_name(&entry.key);
                if keys.contains(setter.as_str()) {
                    return Err(CompilerError::with_key(
                        ERR_SETTER_COLLISION,
                        &format!(
                            "State key \"{}\" collides with the setter generated for \"{}\".",
                            setter, entry.key
                        ),
                        &component.name,
                        &entry.key,
                    ));
                }
            }
        }
        Flavor::PlainVariables => {}
        _ => {
            if keys.contains(receiver) {
                return Err(CompilerError::with_key(
                    ERR_RECEIVER_COLLISION,
                    &format!(
                        "State key \"{}\" collides with the shared store receiver.",
                        receiver
                    ),
                    &component.name,
                    receiver,
                ));
            }
        }
    }

    Ok(())
}
