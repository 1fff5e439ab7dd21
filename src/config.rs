//! Deployment-level configuration for a governance session.
//!
//! Every threshold and window size used by the pipeline lives here and is
//! injected at construction, so independent sessions never share tuning.

use crate::error::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable overriding [`PipelineConfig::entropy_ceiling`].
pub const ENTROPY_CEILING_ENV: &str = "MINDGATE_ENTROPY_MAX";

/// Environment variable overriding [`PipelineConfig::confidence_threshold`].
pub const CONFIDENCE_THRESHOLD_ENV: &str = "MINDGATE_CONFIDENCE_THRESHOLD";

/// Runtime configuration for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stabilize is raised when the smoothed entropy exceeds this.
    /// Default: 0.30.
    pub entropy_ceiling: f64,

    /// Number of entropy samples in the smoothing window.
    /// Default: 10.
    pub entropy_window: usize,

    /// Dampening emitted while stabilize is active.
    /// Default: 0.7.
    pub stabilize_dampening: f64,

    /// Number of K/R samples kept per session.
    /// Default: 6.
    pub history_capacity: usize,

    /// Minimum confidence for `may_act` to allow.
    /// Default: 0.75.
    pub confidence_threshold: f64,

    /// Coherence required to leave cooldown.
    /// Default: 0.90.
    pub cooldown_exit_k: f64,

    /// Turns that must elapse after a segment before cooldown can end.
    /// Default: 2.
    pub cooldown_min_turns: i64,

    /// Countdown armed by each segmentation.
    /// Default: 2.
    pub cooldown_turns: i64,

    /// Slope below which coherence collapse counts as accelerating.
    /// Default: -0.15.
    pub acceleration_slope: f64,

    /// Stricter slope required to segment again during cooldown.
    /// Default: -0.30.
    pub cooldown_slope: f64,

    /// Recursion pressure above which a collapse trigger may fire.
    /// Default: 0.80.
    pub recursion_ceiling: f64,

    /// Coherence below which a turn counts toward saturation.
    /// Default: 0.45.
    pub coherence_floor: f64,

    /// Transcript lines inspected when extracting invariants.
    /// Default: 8.
    pub transcript_lookback: usize,

    /// Maximum invariant lines carried into a seed pack.
    /// Default: 10.
    pub max_invariants: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            entropy_ceiling: 0.30,
            entropy_window: 10,
            stabilize_dampening: 0.7,
            history_capacity: 6,
            confidence_threshold: 0.75,
            cooldown_exit_k: 0.90,
            cooldown_min_turns: 2,
            cooldown_turns: 2,
            acceleration_slope: -0.15,
            cooldown_slope: -0.30,
            recursion_ceiling: 0.80,
            coherence_floor: 0.45,
            transcript_lookback: 8,
            max_invariants: 10,
        }
    }
}

fn unit_interval(name: &str, value: f64) -> GateResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GateError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

impl PipelineConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> GateResult<()> {
        unit_interval("entropy_ceiling", self.entropy_ceiling)?;
        unit_interval("confidence_threshold", self.confidence_threshold)?;
        unit_interval("cooldown_exit_k", self.cooldown_exit_k)?;
        unit_interval("recursion_ceiling", self.recursion_ceiling)?;
        unit_interval("coherence_floor", self.coherence_floor)?;

        if !(self.stabilize_dampening > 0.0 && self.stabilize_dampening <= 1.0) {
            return Err(GateError::Config(format!(
                "stabilize_dampening must be in (0, 1], got {}",
                self.stabilize_dampening
            )));
        }
        if self.entropy_window == 0 {
            return Err(GateError::Config(
                "entropy_window must be >= 1".to_string(),
            ));
        }
        if self.history_capacity < 3 {
            return Err(GateError::Config(format!(
                "history_capacity must be >= 3 to compute a slope, got {}",
                self.history_capacity
            )));
        }
        if self.cooldown_min_turns < 0 || self.cooldown_turns < 0 {
            return Err(GateError::Config(
                "cooldown turn counts must be non-negative".to_string(),
            ));
        }
        if self.acceleration_slope >= 0.0 {
            return Err(GateError::Config(format!(
                "acceleration_slope must be negative, got {}",
                self.acceleration_slope
            )));
        }
        if self.cooldown_slope >= self.acceleration_slope {
            return Err(GateError::Config(format!(
                "cooldown_slope ({}) must be stricter than acceleration_slope ({})",
                self.cooldown_slope, self.acceleration_slope
            )));
        }
        Ok(())
    }

    /// Load from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> GateResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GateError::Config(format!("JSON parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MINDGATE_*` environment overrides on top of this config.
    ///
    /// Unparseable values are ignored with a warning. Range checks are left
    /// to [`validate`](Self::validate), which `Pipeline::new` runs.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|var| env::var(var).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) with an
    /// explicit variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = read_f64(&lookup, ENTROPY_CEILING_ENV) {
            self.entropy_ceiling = v;
        }
        if let Some(v) = read_f64(&lookup, CONFIDENCE_THRESHOLD_ENV) {
            self.confidence_threshold = v;
        }
        self
    }
}

fn read_f64<F>(lookup: &F, var: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var)?;
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::warn!(var, value = %raw, "Ignoring unparseable override: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entropy_window, 10);
        assert_eq!(config.history_capacity, 6);
        assert!((config.entropy_ceiling - 0.30).abs() < 1e-12);
        assert!((config.confidence_threshold - 0.75).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_ceiling() {
        let config = PipelineConfig {
            entropy_ceiling: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn rejects_zero_dampening() {
        let config = PipelineConfig {
            stabilize_dampening: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_window() {
        let config = PipelineConfig {
            entropy_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_lenient_cooldown_slope() {
        let config = PipelineConfig {
            cooldown_slope: -0.10,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cooldown_slope"));
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = PipelineConfig::from_json(r#"{"entropy_ceiling": 0.25}"#).unwrap();
        assert!((config.entropy_ceiling - 0.25).abs() < 1e-12);
        assert_eq!(config.entropy_window, 10);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| {
            owned
                .iter()
                .find(|(k, _)| k == var)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn overrides_apply() {
        let config = PipelineConfig::default().with_overrides_from(vars(&[
            (ENTROPY_CEILING_ENV, " 0.42 "),
            (CONFIDENCE_THRESHOLD_ENV, "0.9"),
        ]));
        assert_eq!(config.entropy_ceiling, 0.42);
        assert_eq!(config.confidence_threshold, 0.9);
        assert_eq!(config.entropy_window, 10);
    }

    #[test]
    fn unparseable_override_is_ignored() {
        let config = PipelineConfig::default().with_overrides_from(vars(&[
            (ENTROPY_CEILING_ENV, "lots"),
            (CONFIDENCE_THRESHOLD_ENV, "0.8"),
        ]));
        assert_eq!(config.entropy_ceiling, 0.30);
        assert_eq!(config.confidence_threshold, 0.8);
    }

    #[test]
    fn unset_overrides_keep_config() {
        let base = PipelineConfig {
            entropy_ceiling: 0.5,
            ..Default::default()
        };
        assert_eq!(base.clone().with_overrides_from(vars(&[])), base);
    }

    #[test]
    fn out_of_range_override_is_rejected_at_construction() {
        let config =
            PipelineConfig::default().with_overrides_from(vars(&[(CONFIDENCE_THRESHOLD_ENV, "1.5")]));
        assert_eq!(config.confidence_threshold, 1.5);

        let err = crate::Pipeline::new(config).unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(PipelineConfig::from_json("not json").is_err());
        assert!(PipelineConfig::from_json(r#"{"entropy_window": 0}"#).is_err());
    }
}
