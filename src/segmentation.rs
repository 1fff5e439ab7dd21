//! Segmentation: deciding when coherence collapse warrants a forced
//! checkpoint, and taking that checkpoint.

use crate::config::PipelineConfig;
use crate::core::Guard;
use crate::tracker::{CarriedInvariants, SessionState};
use serde::{Deserialize, Serialize};

/// Why a seed pack was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentReason {
    LastRecoverableMoment,
}

/// Checkpoint handed back to the caller as a reset point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeedPack {
    pub reason: SegmentReason,
    pub turn: u64,
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub invariants: CarriedInvariants,
    pub trace_hash: String,
}

/// Which collapse pattern fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentTrigger {
    /// Coherence falling fast under high recursion pressure
    Acceleration,
    /// Coherence stuck low for several turns under high recursion pressure
    Saturation,
}

/// Pure segmentation predicate plus the checkpoint operation.
#[derive(Debug)]
pub struct SegmentationDecider {
    acceleration: Guard<SessionState>,
    saturation: Guard<SessionState>,
    cooldown_bar: Guard<SessionState>,
    cooldown_turns: i64,
    transcript_lookback: usize,
    max_invariants: usize,
}

impl SegmentationDecider {
    pub fn new(config: &PipelineConfig) -> Self {
        let slope = config.acceleration_slope;
        let recursion = config.recursion_ceiling;
        let floor = config.coherence_floor;
        let cooldown_slope = config.cooldown_slope;

        let acceleration = Guard::new("acceleration", move |s: &SessionState| {
            s.kt_slope_2 < slope && s.r_t > recursion
        });
        let saturation = Guard::new("saturation", move |s: &SessionState| {
            s.r_t > recursion
                && s.k_t < floor
                && s.k_hist.len() >= 3
                && s.k_hist.tail(3).all(|k| *k < floor)
        });
        let cooldown_bar = Guard::new("cooldown_bar", move |s: &SessionState| {
            s.kt_slope_2 < cooldown_slope
        });

        Self {
            acceleration,
            saturation,
            cooldown_bar,
            cooldown_turns: config.cooldown_turns,
            transcript_lookback: config.transcript_lookback,
            max_invariants: config.max_invariants,
        }
    }

    /// The trigger that fires for `state`, if any.
    ///
    /// During cooldown a trigger only counts when the slope also clears the
    /// stricter cooldown bar.
    pub fn trigger(&self, state: &SessionState) -> Option<SegmentTrigger> {
        let (guard, trigger) = if self.acceleration.check(state) {
            (&self.acceleration, SegmentTrigger::Acceleration)
        } else if self.saturation.check(state) {
            (&self.saturation, SegmentTrigger::Saturation)
        } else {
            return None;
        };

        if state.cooldown_active && !self.cooldown_bar.check(state) {
            tracing::debug!(
                guard = guard.name(),
                bar = self.cooldown_bar.name(),
                turn = state.turn_index,
                "Trigger held back during cooldown"
            );
            return None;
        }
        tracing::debug!(guard = guard.name(), turn = state.turn_index, "Segment trigger fired");
        Some(trigger)
    }

    /// Whether a checkpoint should be forced now. Never mutates `state`.
    pub fn should_segment(&self, state: &SessionState) -> bool {
        self.trigger(state).is_some()
    }

    /// Capture invariants from the transcript, enter cooldown and return the
    /// seed pack.
    ///
    /// Callers are expected to check [`should_segment`](Self::should_segment)
    /// first.
    pub fn segment_now<L: AsRef<str>>(
        &self,
        state: &mut SessionState,
        transcript_lines: &[L],
    ) -> SeedPack {
        state.invariants =
            extract_invariants(transcript_lines, self.transcript_lookback, self.max_invariants);
        state.cooldown_active = true;
        state.cooldown_turns_left = self.cooldown_turns;
        state.last_segment_turn = state.turn_index as i64;

        tracing::info!(
            turn = state.turn_index,
            k_t = state.k_t,
            r_t = state.r_t,
            invariants = state.invariants.constraints.len(),
            "Segment forced; entering cooldown"
        );

        SeedPack {
            reason: SegmentReason::LastRecoverableMoment,
            turn: state.turn_index,
            k_t: state.k_t,
            r_t: state.r_t,
            kt_slope_2: state.kt_slope_2,
            invariants: state.invariants.clone(),
            trace_hash: state.trace_hash.clone(),
        }
    }
}

/// Bullet (`-`) and annotation (`#`) lines among the last `lookback`
/// transcript lines, trimmed and capped at `max`.
pub fn extract_invariants<L: AsRef<str>>(
    transcript_lines: &[L],
    lookback: usize,
    max: usize,
) -> CarriedInvariants {
    let start = transcript_lines.len().saturating_sub(lookback);
    let constraints = transcript_lines[start..]
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| line.starts_with('-') || line.starts_with('#'))
        .take(max)
        .map(str::to_owned)
        .collect();
    CarriedInvariants { constraints }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BoundedRing, Mode};

    fn decider() -> SegmentationDecider {
        SegmentationDecider::new(&PipelineConfig::default())
    }

    fn state_with(k_hist: &[f64], r_t: f64, slope: f64) -> SessionState {
        let mut ring = BoundedRing::with_capacity(6);
        for k in k_hist {
            ring.push(*k);
        }
        SessionState {
            k_t: k_hist.last().copied().unwrap_or(1.0),
            r_t,
            k_hist: ring,
            kt_slope_2: slope,
            turn_index: k_hist.len() as u64,
            ..SessionState::default()
        }
    }

    #[test]
    fn saturation_triggers_segment() {
        let state = state_with(&[0.44, 0.4, 0.3], 0.9, -0.07);
        assert_eq!(decider().trigger(&state), Some(SegmentTrigger::Saturation));
    }

    #[test]
    fn saturation_ignores_entries_older_than_three_turns() {
        let state = state_with(&[0.9, 0.44, 0.4, 0.3], 0.9, -0.07);
        assert!(decider().should_segment(&state));
    }

    #[test]
    fn saturation_requires_every_recent_entry_below_floor() {
        // slope (0.3 - 0.5) / 2 = -0.1 is too shallow for acceleration
        let state = state_with(&[0.5, 0.4, 0.3], 0.9, -0.1);
        assert!(!decider().should_segment(&state));
    }

    #[test]
    fn acceleration_triggers_segment() {
        let state = state_with(&[0.9, 0.7, 0.5], 0.85, -0.2);
        assert_eq!(decider().trigger(&state), Some(SegmentTrigger::Acceleration));
    }

    #[test]
    fn low_recursion_never_segments() {
        let state = state_with(&[0.9, 0.3, 0.1], 0.8, -0.4);
        assert!(!decider().should_segment(&state));
    }

    #[test]
    fn saturation_needs_three_turns() {
        let state = state_with(&[0.2, 0.1], 0.95, 0.0);
        assert!(!decider().should_segment(&state));
    }

    #[test]
    fn cooldown_demands_steeper_slope() {
        let mut state = state_with(&[0.44, 0.4, 0.3], 0.9, -0.20);
        state.cooldown_active = true;
        assert!(!decider().should_segment(&state));

        state.kt_slope_2 = -0.35;
        assert!(decider().should_segment(&state));
    }

    #[test]
    fn should_segment_does_not_mutate() {
        let state = state_with(&[0.4, 0.3, 0.2], 0.9, -0.1);
        let before = state.clone();
        decider().should_segment(&state);
        assert_eq!(state, before);
    }

    #[test]
    fn segment_now_enters_cooldown() {
        let mut state = state_with(&[0.4, 0.3, 0.2], 0.9, -0.1);
        state.trace_hash = "abc".to_string();
        let transcript = ["- keep answers short", "chatter", "# no speculation"];

        let seed = decider().segment_now(&mut state, &transcript);

        assert_eq!(seed.reason, SegmentReason::LastRecoverableMoment);
        assert_eq!(seed.turn, 3);
        assert_eq!(seed.trace_hash, "abc");
        assert_eq!(
            seed.invariants.constraints,
            vec!["- keep answers short", "# no speculation"]
        );
        assert!(state.cooldown_active);
        assert_eq!(state.cooldown_turns_left, 2);
        assert_eq!(state.last_segment_turn, 3);
        assert_eq!(state.mode(), Mode::Cooldown);
    }

    #[test]
    fn extract_invariants_uses_recent_lines_only() {
        let mut lines: Vec<String> = vec!["- too old".to_string()];
        lines.extend((0..8).map(|i| format!("  # note {i}  ")));
        let invariants = extract_invariants(&lines, 8, 10);
        assert_eq!(invariants.constraints.len(), 8);
        assert_eq!(invariants.constraints[0], "# note 0");
        assert!(!invariants.constraints.contains(&"- too old".to_string()));
    }

    #[test]
    fn extract_invariants_caps_count() {
        let lines: Vec<String> = (0..30).map(|i| format!("- rule {i}")).collect();
        let invariants = extract_invariants(&lines, 30, 10);
        assert_eq!(invariants.constraints.len(), 10);
        assert_eq!(invariants.constraints[0], "- rule 0");
    }

    #[test]
    fn seed_pack_serializes_reason() {
        let mut state = state_with(&[0.4, 0.3, 0.2], 0.9, -0.1);
        let seed = decider().segment_now(&mut state, &Vec::<String>::new());
        let json = serde_json::to_value(&seed).unwrap();
        assert_eq!(json["reason"], "LAST_RECOVERABLE_MOMENT");
        assert!(json.get("K_t").is_some());
        assert!(json.get("Kt_slope_2").is_some());
    }
}
