//! Per-session state tracking: rolling K/R histories, slope, cooldown
//! hysteresis and the reproducible trace digest.

use crate::config::PipelineConfig;
use crate::core::{BoundedRing, Mode};
use crate::signals::{estimate_coherence, estimate_recursion};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Hex characters kept from the SHA-256 digest.
pub const TRACE_HASH_LEN: usize = 16;

/// Invariant lines carried over from the transcript at the last segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarriedInvariants {
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// Mutable state of one governance session.
///
/// Created with defaults at session start and mutated once per turn by
/// [`StateTracker::update`]. Field names serialize exactly as the persisted
/// session format expects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "K_hist")]
    pub k_hist: BoundedRing<f64>,
    #[serde(rename = "R_hist")]
    pub r_hist: BoundedRing<f64>,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub turn_index: u64,
    pub cooldown_active: bool,
    pub cooldown_turns_left: i64,
    #[serde(rename = "cooldown_exit_K")]
    pub cooldown_exit_k: f64,
    pub cooldown_min_turns: i64,
    pub last_segment_turn: i64,
    #[serde(default)]
    pub invariants: CarriedInvariants,
    pub trace_hash: String,
    /// Token set of the previous turn, consumed by the overlap penalty
    #[serde(default)]
    pub previous_tokens: BTreeSet<String>,
}

impl SessionState {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            k_t: 1.0,
            r_t: 0.0,
            k_hist: BoundedRing::with_capacity(config.history_capacity),
            r_hist: BoundedRing::with_capacity(config.history_capacity),
            kt_slope_2: 0.0,
            turn_index: 0,
            cooldown_active: false,
            cooldown_turns_left: 0,
            cooldown_exit_k: config.cooldown_exit_k,
            cooldown_min_turns: config.cooldown_min_turns,
            last_segment_turn: -10,
            invariants: CarriedInvariants::default(),
            trace_hash: String::new(),
            previous_tokens: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_cooldown(self.cooldown_active)
    }

    /// Turns elapsed since the last forced segment.
    pub fn turns_since_segment(&self) -> i64 {
        self.turn_index as i64 - self.last_segment_turn
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

/// Metrics reported for each processed turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    pub turn: u64,
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub cooldown: bool,
    pub trace_hash: String,
}

/// Applies one turn of text to a [`SessionState`].
#[derive(Clone, Debug)]
pub struct StateTracker {
    history_capacity: usize,
}

impl StateTracker {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
        }
    }

    /// Score `text`, advance the session one turn and report its metrics.
    ///
    /// Cooldown ends only when the minimum turn count has elapsed since the
    /// last segment, the countdown has expired, and coherence has recovered
    /// to `cooldown_exit_K`.
    pub fn update(&self, state: &mut SessionState, text: &str) -> TurnMetrics {
        let k = estimate_coherence(text, &mut state.previous_tokens);
        let r = estimate_recursion(text);

        state.turn_index += 1;
        state.k_hist.set_capacity(self.history_capacity);
        state.r_hist.set_capacity(self.history_capacity);
        state.k_hist.push(k);
        state.r_hist.push(r);

        state.kt_slope_2 = match (state.k_hist.nth_from_end(0), state.k_hist.nth_from_end(2)) {
            (Some(newest), Some(oldest)) => (newest - oldest) / 2.0,
            _ => 0.0,
        };
        state.k_t = k;
        state.r_t = r;
        state.trace_hash = trace_hash(
            &state.k_hist.to_vec(),
            &state.r_hist.to_vec(),
            state.turn_index,
        );

        if state.cooldown_active {
            state.cooldown_turns_left -= 1;
            let served = state.turns_since_segment() >= state.cooldown_min_turns;
            if served && state.cooldown_turns_left <= 0 && state.k_t >= state.cooldown_exit_k {
                state.cooldown_active = false;
                tracing::info!(
                    turn = state.turn_index,
                    k_t = state.k_t,
                    "Coherence recovered; leaving cooldown"
                );
            }
        }

        tracing::debug!(
            turn = state.turn_index,
            k_t = k,
            r_t = r,
            slope = state.kt_slope_2,
            cooldown = state.cooldown_active,
            "Turn tracked"
        );

        TurnMetrics {
            turn: state.turn_index,
            k_t: state.k_t,
            r_t: state.r_t,
            kt_slope_2: state.kt_slope_2,
            cooldown: state.cooldown_active,
            trace_hash: state.trace_hash.clone(),
        }
    }
}

/// Deterministic digest over `(K_hist, R_hist, turn_index)`.
///
/// Hashes the canonical text `{"K": [..], "R": [..], "t": N}` with sorted
/// keys, so the same histories always reproduce the same digest.
///
/// # Example
///
/// ```rust
/// use mindgate::tracker::trace_hash;
///
/// assert_eq!(trace_hash(&[0.6], &[0.0], 1), "4230b11a7bface2d");
/// ```
pub fn trace_hash(k_hist: &[f64], r_hist: &[f64], turn_index: u64) -> String {
    let canonical = format!(
        "{{\"K\": {}, \"R\": {}, \"t\": {}}}",
        float_list(k_hist),
        float_list(r_hist),
        turn_index
    );
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(TRACE_HASH_LEN);
    hash
}

fn float_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| canonical_float(*v)).collect();
    format!("[{}]", items.join(", "))
}

/// Shortest round-trip float text: integral values keep a `.0`, and
/// magnitudes below 1e-4 use an exponent with at least two digits.
fn canonical_float(v: f64) -> String {
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    if v.abs() < 1e-4 {
        let formatted = format!("{v:e}");
        let (mantissa, exponent) = formatted
            .split_once('e')
            .unwrap_or((formatted.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    let formatted = format!("{v}");
    if formatted.contains('.') {
        formatted
    } else {
        format!("{formatted}.0")
    }
}
