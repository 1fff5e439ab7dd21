//! Actuation and execution gates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default confidence required before any action is allowed.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Outcome of an invariant audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantStatus {
    Clean,
    Violated,
    Unverifiable,
}

impl InvariantStatus {
    pub fn is_clean(self) -> bool {
        self == Self::Clean
    }
}

impl fmt::Display for InvariantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clean => "CLEAN",
            Self::Violated => "VIOLATED",
            Self::Unverifiable => "UNVERIFIABLE",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Allow,
    Deny,
}

/// A verdict with the first rule that decided it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: Verdict,
    pub reason: String,
}

impl Decision {
    fn allow(reason: &str) -> Self {
        Self {
            decision: Verdict::Allow,
            reason: reason.to_owned(),
        }
    }

    fn deny(reason: &str) -> Self {
        Self {
            decision: Verdict::Deny,
            reason: reason.to_owned(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Verdict::Allow
    }
}

/// Externally supplied policy view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default = "default_allow_action")]
    pub allow_action: bool,
}

fn default_allow_action() -> bool {
    true
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self {
            allow_action: default_allow_action(),
        }
    }
}

/// Whether execution was explicitly switched on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    #[default]
    DryRun,
    Execute,
}

/// Decide whether acting is permitted.
///
/// Rules run in order and the first failing one decides: invariants, then
/// confidence, then policy.
///
/// # Example
///
/// ```rust
/// use mindgate::actuation::{may_act, InvariantStatus, Verdict, DEFAULT_CONFIDENCE_THRESHOLD};
///
/// let denied = may_act(1.0, InvariantStatus::Violated, None, DEFAULT_CONFIDENCE_THRESHOLD);
/// assert_eq!(denied.decision, Verdict::Deny);
/// assert_eq!(denied.reason, "invariants not clean");
///
/// let allowed = may_act(0.9, InvariantStatus::Clean, None, DEFAULT_CONFIDENCE_THRESHOLD);
/// assert!(allowed.is_allowed());
/// ```
pub fn may_act(
    confidence: f64,
    invariant_status: InvariantStatus,
    policy: Option<&PolicySnapshot>,
    threshold: f64,
) -> Decision {
    if !invariant_status.is_clean() {
        return Decision::deny("invariants not clean");
    }
    // NaN on either side never reaches the threshold.
    let reaches = matches!(
        confidence.partial_cmp(&threshold),
        Some(Ordering::Greater | Ordering::Equal)
    );
    if !reaches {
        return Decision::deny("confidence below threshold");
    }
    if let Some(policy) = policy {
        if !policy.allow_action {
            return Decision::deny("policy prohibits action");
        }
    }
    Decision::allow("all thresholds satisfied")
}

/// Final execution gate. Denies unless execution mode, operator approval and
/// at least one capability are all present.
pub fn may_execute<C: AsRef<str>>(
    capabilities: &[C],
    mode: ExecutionMode,
    operator_ok: bool,
) -> Decision {
    if mode != ExecutionMode::Execute {
        return Decision::deny("execution mode not enabled");
    }
    if !operator_ok {
        return Decision::deny("operator approval not present");
    }
    if capabilities.is_empty() {
        return Decision::deny("no executable capabilities");
    }
    Decision::allow("explicit execution binding satisfied")
}
