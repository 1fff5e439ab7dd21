//! Static intent to capability bindings.

use super::gate::InvariantStatus;
use serde::{Deserialize, Serialize};

/// Confidence below which no capability is bound.
pub const MIN_BINDING_CONFIDENCE: f64 = 0.5;

const INTENT_BINDINGS: &[(&str, &[&str])] = &[
    ("statement", &[]),
    ("explanation", &["explain"]),
    ("question", &["explain"]),
    ("request", &[]),
];

/// Capabilities an intent may use, with the rule that decided it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    pub allowed: Vec<String>,
    pub reason: String,
}

impl CapabilityGrant {
    fn none(reason: &str) -> Self {
        Self {
            allowed: Vec::new(),
            reason: reason.to_owned(),
        }
    }
}

/// Capabilities bound to `intent`. Unknown intents bind nothing.
pub fn allowed_capabilities(
    intent: &str,
    confidence: f64,
    invariant_status: InvariantStatus,
) -> CapabilityGrant {
    if !invariant_status.is_clean() {
        return CapabilityGrant::none("invariants not clean");
    }
    if confidence < MIN_BINDING_CONFIDENCE {
        return CapabilityGrant::none("confidence too low");
    }

    let allowed = INTENT_BINDINGS
        .iter()
        .find(|(name, _)| *name == intent)
        .map(|(_, caps)| caps.iter().map(|c| (*c).to_owned()).collect())
        .unwrap_or_default();

    CapabilityGrant {
        allowed,
        reason: "explicit binding".to_owned(),
    }
}
