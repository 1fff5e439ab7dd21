//! Property-based tests for the signal and gating layers.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use mindgate::actuation::{compute_confidence, may_act, InvariantStatus, Verdict};
use mindgate::core::{BoundedRing, Mode, State, StateHistory, StateTransition};
use mindgate::segmentation::SegmentationDecider;
use mindgate::signals::{
    estimate_coherence, estimate_recursion, measure_entropy, Constraint, EntropyGate, Snapshot,
};
use mindgate::tracker::{trace_hash, SessionState, StateTracker};
use mindgate::PipelineConfig;
use proptest::prelude::*;
use std::collections::BTreeSet;

prop_compose! {
    fn unclean_status()(violated in any::<bool>()) -> InvariantStatus {
        if violated {
            InvariantStatus::Violated
        } else {
            InvariantStatus::Unverifiable
        }
    }
}

prop_compose! {
    fn snapshot_with(stabilized: bool)(mean_entropy in 0.0f64..=1.0) -> Snapshot {
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
}

fn history_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, 0..6)
}

proptest! {
    #[test]
    fn entropy_is_bounded(text in ".*") {
        let e = measure_entropy(&text);
        prop_assert!((0.0..=1.0).contains(&e));
    }

    #[test]
    fn coherence_and_recursion_are_bounded(first in ".*", second in ".*") {
        let mut carried = BTreeSet::new();
        for text in [&first, &second] {
            let k = estimate_coherence(text, &mut carried);
            let r = estimate_recursion(text);
            prop_assert!((0.0..=1.0).contains(&k));
            prop_assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn mean_entropy_tracks_recent_window(texts in prop::collection::vec("[a-e ]{1,30}", 1..25)) {
        let mut gate = EntropyGate::new(&PipelineConfig::default());
        let mut samples = Vec::new();
        let mut last = None;
        for text in &texts {
            samples.push(measure_entropy(text.trim()));
            last = Some(gate.process(text).0);
        }

        let recent = &samples[samples.len().saturating_sub(10)..];
        let expected = recent.iter().sum::<f64>() / recent.len() as f64;
        let snapshot = last.unwrap();
        prop_assert!((snapshot.mean_entropy - expected).abs() <= 5e-5 + 1e-12);
        prop_assert!(gate.window().len() <= 10);
    }

    #[test]
    fn confidence_never_rises_with_entropy(
        low in snapshot_with(false),
        high in snapshot_with(false),
    ) {
        let (low, high) = if low.mean_entropy <= high.mean_entropy {
            (low, high)
        } else {
            (high, low)
        };
        prop_assert!(compute_confidence(Some(&low), None) >= compute_confidence(Some(&high), None));
    }

    #[test]
    fn stabilization_never_raises_confidence(calm in snapshot_with(false)) {
        let mut stabilized = calm.clone();
        stabilized.active_constraints.insert(Constraint::Stabilize);
        prop_assert!(compute_confidence(Some(&stabilized), None) <= compute_confidence(Some(&calm), None));
    }

    #[test]
    fn unclean_invariants_zero_confidence(
        snapshot in snapshot_with(false),
        status in unclean_status(),
    ) {
        prop_assert_eq!(compute_confidence(Some(&snapshot), Some(status)), 0.0);
    }

    #[test]
    fn may_act_denies_unclean_invariants(
        confidence in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
        status in unclean_status(),
    ) {
        let decision = may_act(confidence, status, None, threshold);
        prop_assert_eq!(decision.decision, Verdict::Deny);
        let decision = may_act(1.0, status, None, threshold);
        prop_assert_eq!(decision.decision, Verdict::Deny);
    }

    #[test]
    fn trace_hash_is_reproducible(
        k in history_strategy(),
        r in history_strategy(),
        turn in 0u64..1_000,
    ) {
        let first = trace_hash(&k, &r, turn);
        let second = trace_hash(&k.clone(), &r.clone(), turn);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), 16);
        prop_assert_ne!(first, trace_hash(&k, &r, turn + 1));
    }

    #[test]
    fn trace_hash_sees_every_history_element(
        k in prop::collection::vec(0.0f64..=1.0, 1..6),
        index in any::<prop::sample::Index>(),
    ) {
        let mut changed = k.clone();
        let i = index.index(changed.len());
        changed[i] = if changed[i] > 0.5 { 0.125 } else { 0.875 };
        prop_assert_ne!(trace_hash(&k, &[], 3), trace_hash(&changed, &[], 3));
    }

    #[test]
    fn independent_sessions_agree(texts in prop::collection::vec("[a-z .!?]{0,60}", 1..12)) {
        let config = PipelineConfig::default();
        let tracker = StateTracker::new(&config);
        let mut a = SessionState::new(&config);
        let mut b = SessionState::new(&config);
        for text in &texts {
            let ma = tracker.update(&mut a, text);
            let mb = tracker.update(&mut b, text);
            prop_assert_eq!(ma, mb);
        }
        prop_assert!(a.k_hist.len() <= config.history_capacity);
        prop_assert_eq!(a.turn_index, texts.len() as u64);
    }

    #[test]
    fn two_turns_never_have_slope(text in ".*") {
        let config = PipelineConfig::default();
        let tracker = StateTracker::new(&config);
        let mut state = SessionState::new(&config);
        tracker.update(&mut state, &text);
        tracker.update(&mut state, &text);
        prop_assert_eq!(state.k_hist.len(), 2);
        prop_assert_eq!(state.kt_slope_2, 0.0);
    }

    #[test]
    fn ring_keeps_newest_values(
        values in prop::collection::vec(any::<i32>(), 0..40),
        capacity in 1usize..12,
    ) {
        let mut ring = BoundedRing::with_capacity(capacity);
        for v in &values {
            ring.push(*v);
        }
        let expected = values[values.len().saturating_sub(capacity)..].to_vec();
        prop_assert_eq!(ring.to_vec(), expected);
        prop_assert!(ring.len() <= capacity);
    }

    #[test]
    fn no_segment_without_recursion_pressure(
        k_values in prop::collection::vec(0.0f64..=1.0, 0..10),
        slope in -1.0f64..=1.0,
        r_t in 0.0f64..=0.8,
    ) {
        let decider = SegmentationDecider::new(&PipelineConfig::default());
        let mut state = SessionState::default();
        for k in &k_values {
            state.k_hist.push(*k);
        }
        state.k_t = k_values.last().copied().unwrap_or(1.0);
        state.kt_slope_2 = slope;
        state.r_t = r_t;

        prop_assert!(!decider.should_segment(&state));
    }

    #[test]
    fn mode_tracks_session_cooldown_flag(cooldown in any::<bool>(), turns_left in -3i64..10) {
        let state = SessionState {
            cooldown_active: cooldown,
            cooldown_turns_left: turns_left,
            ..SessionState::default()
        };
        let mode = state.mode();
        prop_assert_eq!(mode, Mode::from_cooldown(cooldown));
        prop_assert_eq!(mode.name() == "COOLDOWN", cooldown);
    }

    #[test]
    fn history_preserves_order(turns in prop::collection::vec(1u64..100, 1..10)) {
        let mut history = StateHistory::new();
        let mut mode = Mode::Normal;
        for turn in &turns {
            let next = Mode::from_cooldown(mode == Mode::Normal);
            history = history.record(StateTransition {
                from: mode,
                to: next,
                timestamp: Utc::now(),
                turn: *turn,
            });
            mode = next;
        }

        let path = history.get_path();
        prop_assert_eq!(path.len(), turns.len() + 1);
        prop_assert_eq!(path[0], &Mode::Normal);
        let recorded: Vec<u64> = history.transitions().iter().map(|t| t.turn).collect();
        prop_assert_eq!(recorded, turns);
    }

    #[test]
    fn history_serialization_roundtrip(turns in prop::collection::vec(1u64..100, 0..6)) {
        let mut history = StateHistory::new();
        for turn in &turns {
            history = history.record(StateTransition {
                from: Mode::Normal,
                to: Mode::Cooldown,
                timestamp: Utc::now(),
                turn: *turn,
            });
        }
        let json = serde_json::to_string(&history).unwrap();
        let restored: StateHistory<Mode> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored.transitions().len(), turns.len());
    }
}
