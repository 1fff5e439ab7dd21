//! Entropy gate: smoothed lexical diversity and the stabilize constraint.

use crate::config::PipelineConfig;
use crate::core::{round_to, BoundedRing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Constraint tags a gate may raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Smoothed entropy is above the configured ceiling
    Stabilize,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stabilize => f.write_str("stabilize"),
        }
    }
}

/// Gate reading for one turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Entropy of this turn, rounded to 4 decimals
    pub entropy: f64,
    /// Mean entropy over the window, rounded to 4 decimals
    pub mean_entropy: f64,
    pub active_constraints: BTreeSet<Constraint>,
    /// Never inferred; present so audits can prove it stayed zero
    pub identity_pressure: f64,
    pub ts: DateTime<Utc>,
}

impl Snapshot {
    pub fn is_stabilized(&self) -> bool {
        self.active_constraints.contains(&Constraint::Stabilize)
    }
}

/// Distinct-character count over character count.
///
/// Returns `0.0` for empty text. The result is always within `[0, 1]`.
///
/// # Example
///
/// ```rust
/// use mindgate::signals::measure_entropy;
///
/// assert_eq!(measure_entropy(""), 0.0);
/// assert_eq!(measure_entropy("aaaa"), 0.25);
/// assert_eq!(measure_entropy("abcd"), 1.0);
/// ```
pub fn measure_entropy(text: &str) -> f64 {
    let mut distinct = BTreeSet::new();
    let mut total = 0usize;
    for ch in text.chars() {
        distinct.insert(ch);
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    distinct.len() as f64 / total as f64
}

/// Sliding-window entropy smoother.
///
/// Each session owns its own gate; the window is never shared.
#[derive(Clone, Debug)]
pub struct EntropyGate {
    window: BoundedRing<f64>,
    ceiling: f64,
    stabilize_dampening: f64,
    identity_pressure: f64,
}

impl EntropyGate {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            window: BoundedRing::with_capacity(config.entropy_window),
            ceiling: config.entropy_ceiling,
            stabilize_dampening: config.stabilize_dampening,
            identity_pressure: 0.0,
        }
    }

    /// Rebuild a gate around a previously captured window.
    pub fn with_window(config: &PipelineConfig, mut window: BoundedRing<f64>) -> Self {
        window.set_capacity(config.entropy_window);
        Self {
            window,
            ..Self::new(config)
        }
    }

    /// Measure one turn, update the window and emit `(snapshot, dampening)`.
    ///
    /// Dampening is `1.0` normally and the configured stabilize dampening
    /// while the stabilize constraint is active.
    pub fn process(&mut self, text: &str) -> (Snapshot, f64) {
        let entropy = measure_entropy(text.trim());
        self.window.push(entropy);
        let mean_entropy = self.window.mean();

        let mut active_constraints = BTreeSet::new();
        if mean_entropy > self.ceiling {
            active_constraints.insert(Constraint::Stabilize);
        }

        let dampening = if active_constraints.contains(&Constraint::Stabilize) {
            self.stabilize_dampening
        } else {
            1.0
        };

        let snapshot = Snapshot {
            entropy: round_to(entropy, 4),
            mean_entropy: round_to(mean_entropy, 4),
            active_constraints,
            identity_pressure: round_to(self.identity_pressure, 4),
            ts: Utc::now(),
        };
        (snapshot, dampening)
    }

    pub fn window(&self) -> &BoundedRing<f64> {
        &self.window
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }
}
