//! One governance session end to end.
//!
//! The pipeline owns every per-session piece (gate window, tracker state,
//! mode history) so independent sessions never share mutable state. The
//! instrumentation log is the only thing that may be shared, behind an `Arc`.

use crate::actuation::{compute_confidence, may_act, Decision, InvariantStatus, PolicySnapshot};
use crate::audit::InstrumentationLog;
use crate::checkpoint::{SessionCheckpoint, CHECKPOINT_VERSION};
use crate::config::PipelineConfig;
use crate::core::{Mode, State, StateHistory, StateTransition};
use crate::error::GateResult;
use crate::segmentation::{SeedPack, SegmentationDecider};
use crate::signals::{EntropyGate, Snapshot};
use crate::tracker::{SessionState, StateTracker, TurnMetrics};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything measured for one turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub snapshot: Snapshot,
    pub dampening: f64,
    pub metrics: TurnMetrics,
    /// Whether a checkpoint should be forced before the next turn
    pub segment: bool,
}

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    gate: EntropyGate,
    tracker: StateTracker,
    decider: SegmentationDecider,
    state: SessionState,
    history: StateHistory<Mode>,
    last_snapshot: Option<Snapshot>,
    log: Option<Arc<InstrumentationLog>>,
}

impl Pipeline {
    /// Fresh session with `config`, which is validated first.
    pub fn new(config: PipelineConfig) -> GateResult<Self> {
        config.validate()?;
        Ok(Self::assemble(
            config.clone(),
            EntropyGate::new(&config),
            SessionState::new(&config),
            StateHistory::new(),
            None,
        ))
    }

    /// Record every gate observation in `log`.
    pub fn with_log(mut self, log: Arc<InstrumentationLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Carry on a session from a checkpoint.
    pub fn resume(checkpoint: SessionCheckpoint) -> GateResult<Self> {
        checkpoint.validate()?;
        let SessionCheckpoint {
            config,
            mut state,
            entropy_window,
            last_snapshot,
            history,
            ..
        } = checkpoint;

        state.k_hist.set_capacity(config.history_capacity);
        state.r_hist.set_capacity(config.history_capacity);
        let gate = EntropyGate::with_window(&config, entropy_window);

        tracing::info!(
            turn = state.turn_index,
            mode = ?state.mode(),
            "Session resumed from checkpoint"
        );
        Ok(Self::assemble(config, gate, state, history, last_snapshot))
    }

    fn assemble(
        config: PipelineConfig,
        gate: EntropyGate,
        state: SessionState,
        history: StateHistory<Mode>,
        last_snapshot: Option<Snapshot>,
    ) -> Self {
        Self {
            tracker: StateTracker::new(&config),
            decider: SegmentationDecider::new(&config),
            config,
            gate,
            state,
            history,
            last_snapshot,
            log: None,
        }
    }

    /// Run one turn through the gate and the tracker.
    ///
    /// The in-memory update always happens. A failure to append to an
    /// attached log is returned afterwards, with the session already
    /// advanced.
    pub fn observe(&mut self, text: &str) -> GateResult<TurnOutcome> {
        let mode_before = self.state.mode();

        let (snapshot, dampening) = self.gate.process(text);
        let metrics = self.tracker.update(&mut self.state, text);
        self.record_mode_change(mode_before);
        self.last_snapshot = Some(snapshot.clone());

        let segment = self.decider.should_segment(&self.state);
        tracing::debug!(
            turn = metrics.turn,
            entropy = snapshot.entropy,
            mean_entropy = snapshot.mean_entropy,
            dampening,
            segment,
            "Turn observed"
        );

        if let Some(log) = &self.log {
            log.append(&snapshot, dampening)?;
        }

        Ok(TurnOutcome {
            snapshot,
            dampening,
            metrics,
            segment,
        })
    }

    /// Force a checkpoint when the segmentation triggers hold.
    ///
    /// Returns `None`, leaving the session untouched, when they do not.
    pub fn checkpoint<L: AsRef<str>>(&mut self, transcript_lines: &[L]) -> Option<SeedPack> {
        let trigger = self.decider.trigger(&self.state)?;
        let mode_before = self.state.mode();
        let seed = self.decider.segment_now(&mut self.state, transcript_lines);
        self.record_mode_change(mode_before);
        tracing::debug!(turn = seed.turn, ?trigger, "Seed pack issued");
        Some(seed)
    }

    /// Confidence in the latest turn given an audit status.
    pub fn confidence(&self, invariant_status: InvariantStatus) -> f64 {
        compute_confidence(self.last_snapshot.as_ref(), Some(invariant_status))
    }

    /// Actuation decision for the latest turn at the configured threshold.
    pub fn decide(
        &self,
        invariant_status: InvariantStatus,
        policy: Option<&PolicySnapshot>,
    ) -> Decision {
        may_act(
            self.confidence(invariant_status),
            invariant_status,
            policy,
            self.config.confidence_threshold,
        )
    }

    pub fn checkpoint_state(&self) -> SessionCheckpoint {
        SessionCheckpoint {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            config: self.config.clone(),
            state: self.state.clone(),
            entropy_window: self.gate.window().clone(),
            last_snapshot: self.last_snapshot.clone(),
            history: self.history.clone(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn history(&self) -> &StateHistory<Mode> {
        &self.history
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn log(&self) -> Option<&Arc<InstrumentationLog>> {
        self.log.as_ref()
    }

    fn record_mode_change(&mut self, before: Mode) {
        let after = self.state.mode();
        if after == before {
            return;
        }
        self.history = self.history.record(StateTransition {
            from: before,
            to: after,
            timestamp: Utc::now(),
            turn: self.state.turn_index,
        });
        tracing::debug!(
            from = before.name(),
            to = after.name(),
            turn = self.state.turn_index,
            "Mode transition recorded"
        );
    }
}
