//! Confidence scoring from measured gate pressure.

use super::gate::InvariantStatus;
use crate::core::{clamp01, round_to};
use crate::signals::Snapshot;

const ENTROPY_WEIGHT: f64 = 0.4;
const STABILIZE_PENALTY: f64 = 0.2;

/// Bounded confidence in `[0, 1]`, rounded to 3 decimals.
///
/// A missing snapshot reads as zero entropy with no stabilization, and a
/// missing status reads as clean. Any non-clean status forces `0.0`.
///
/// # Example
///
/// ```rust
/// use mindgate::actuation::{compute_confidence, InvariantStatus};
///
/// assert_eq!(compute_confidence(None, None), 1.0);
/// assert_eq!(compute_confidence(None, Some(InvariantStatus::Violated)), 0.0);
/// ```
pub fn compute_confidence(
    snapshot: Option<&Snapshot>,
    invariant_status: Option<InvariantStatus>,
) -> f64 {
    let (entropy, stabilized) = snapshot
        .map(|s| (s.mean_entropy, s.is_stabilized()))
        .unwrap_or((0.0, false));
    let invariant_clean = invariant_status.map_or(true, InvariantStatus::is_clean);

    let mut confidence = 1.0 - entropy.min(1.0) * ENTROPY_WEIGHT;
    if stabilized {
        confidence -= STABILIZE_PENALTY;
    }
    if !invariant_clean {
        confidence = 0.0;
    }
    round_to(clamp01(confidence), 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Constraint;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn snapshot(mean_entropy: f64, stabilized: bool) -> Snapshot {
        let mut active_constraints = BTreeSet::new();
        if stabilized {
            active_constraints.insert(Constraint::Stabilize);
        }
        Snapshot {
            entropy: mean_entropy,
            mean_entropy,
            active_constraints,
            identity_pressure: 0.0,
            ts: Utc::now(),
        }
    }

    #[test]
    fn defaults_give_full_confidence() {
        assert_eq!(compute_confidence(None, None), 1.0);
        assert_eq!(compute_confidence(None, Some(InvariantStatus::Clean)), 1.0);
    }

    #[test]
    fn entropy_reduces_confidence() {
        assert_eq!(compute_confidence(Some(&snapshot(0.25, false)), None), 0.9);
    }

    #[test]
    fn stabilization_costs_extra() {
        // 1.0 - 0.5 * 0.4 - 0.2
        assert_eq!(compute_confidence(Some(&snapshot(0.5, true)), None), 0.6);
    }

    #[test]
    fn reads_mean_entropy_not_turn_entropy() {
        let mut s = snapshot(0.1, false);
        s.entropy = 0.9;
        assert_eq!(compute_confidence(Some(&s), None), 0.96);
    }

    #[test]
    fn unverifiable_counts_as_unclean() {
        let s = snapshot(0.0, false);
        assert_eq!(
            compute_confidence(Some(&s), Some(InvariantStatus::Unverifiable)),
            0.0
        );
    }

    #[test]
    fn result_is_rounded_to_three_places() {
        // 1.0 - 0.12345 * 0.4 = 0.95062
        assert_eq!(compute_confidence(Some(&snapshot(0.12345, false)), None), 0.951);
    }
}
