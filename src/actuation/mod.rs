//! Confidence scoring and the decision gates that consume it.
//!
//! Every function here returns a decision record only. Nothing is ever
//! executed.

mod bindings;
mod confidence;
mod gate;

pub use bindings::{allowed_capabilities, CapabilityGrant, MIN_BINDING_CONFIDENCE};
pub use confidence::compute_confidence;
pub use gate::{
    may_act, may_execute, Decision, ExecutionMode, InvariantStatus, PolicySnapshot, Verdict,
    DEFAULT_CONFIDENCE_THRESHOLD,
};
