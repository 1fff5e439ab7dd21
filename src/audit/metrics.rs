//! Read-only aggregation and advisory over logged records.
//!
//! Nothing here feeds back into the gate. Advice is text for a human
//! operator.

use super::instrumentation::LogRecord;
use crate::core::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Window used by [`recent_view`] when the caller has no preference.
pub const RECENT_WINDOW: usize = 20;

/// Aggregate over a set of records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub observations: usize,
    pub avg_entropy: f64,
    pub avg_mean_entropy: f64,
    pub stabilization_rate: f64,
    pub avg_dampening: f64,
}

/// Summary of `records`, `None` when there are none.
pub fn summarize(records: &[LogRecord]) -> Option<MetricsSummary> {
    if records.is_empty() {
        return None;
    }
    let total = records.len() as f64;
    let avg = |field: fn(&LogRecord) -> f64| records.iter().map(field).sum::<f64>() / total;
    let stabilized = records.iter().filter(|r| r.is_stabilized()).count();

    Some(MetricsSummary {
        observations: records.len(),
        avg_entropy: avg(|r| r.entropy),
        avg_mean_entropy: avg(|r| r.mean_entropy),
        stabilization_rate: stabilized as f64 / total,
        avg_dampening: avg(|r| r.dampening),
    })
}

/// Direction of a series, judged from its first and last values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Rising => "↑",
            Self::Falling => "↓",
            Self::Flat => "→",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

/// Flat for fewer than two values.
pub fn trend(values: &[f64]) -> Trend {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() >= 2 => {
            if last > first {
                Trend::Rising
            } else if last < first {
                Trend::Falling
            } else {
                Trend::Flat
            }
        }
        _ => Trend::Flat,
    }
}

/// The newest `n` records.
pub fn recent(records: &[LogRecord], n: usize) -> &[LogRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// Trend view over a recent window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentView {
    pub events: usize,
    pub entropy_trend: Trend,
    pub mean_entropy_trend: Trend,
    pub dampening_trend: Trend,
    pub stabilizations: usize,
    pub avg_entropy: f64,
    pub avg_dampening: f64,
}

/// Trends over the newest `n` records, `None` when there are none.
pub fn recent_view(records: &[LogRecord], n: usize) -> Option<RecentView> {
    let window = recent(records, n);
    let summary = summarize(window)?;
    let series = |field: fn(&LogRecord) -> f64| window.iter().map(field).collect::<Vec<_>>();

    Some(RecentView {
        events: window.len(),
        entropy_trend: trend(&series(|r| r.entropy)),
        mean_entropy_trend: trend(&series(|r| r.mean_entropy)),
        dampening_trend: trend(&series(|r| r.dampening)),
        stabilizations: window.iter().filter(|r| r.is_stabilized()).count(),
        avg_entropy: summary.avg_entropy,
        avg_dampening: summary.avg_dampening,
    })
}

/// Advisory thresholds. They are compared against, never enforced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryTargets {
    pub entropy: f64,
    pub stabilization_rate: f64,
    pub dampening: f64,
}

impl Default for AdvisoryTargets {
    fn default() -> Self {
        Self {
            entropy: 0.35,
            stabilization_rate: 0.60,
            dampening: 0.80,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryStatus {
    NoData,
    Analyzed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub status: AdvisoryStatus,
    pub observations: usize,
    /// Rounded to 4 decimals
    pub avg_entropy: Option<f64>,
    /// Rounded to 3 decimals
    pub stabilization_rate: Option<f64>,
    /// Rounded to 3 decimals
    pub avg_dampening: Option<f64>,
    pub recommendations: Vec<String>,
}

/// Recommendations for an operator based on `summary`.
///
/// # Example
///
/// ```rust
/// use mindgate::audit::{advise, AdvisoryStatus, AdvisoryTargets};
///
/// let advisory = advise(None, &AdvisoryTargets::default());
/// assert_eq!(advisory.status, AdvisoryStatus::NoData);
/// assert_eq!(advisory.recommendations, vec!["collect more observations"]);
/// ```
pub fn advise(summary: Option<&MetricsSummary>, targets: &AdvisoryTargets) -> Advisory {
    let Some(summary) = summary else {
        return Advisory {
            status: AdvisoryStatus::NoData,
            observations: 0,
            avg_entropy: None,
            stabilization_rate: None,
            avg_dampening: None,
            recommendations: vec!["collect more observations".to_owned()],
        };
    };

    let mut recommendations = Vec::new();
    if summary.avg_entropy > targets.entropy {
        recommendations.push("consider lowering the entropy ceiling".to_owned());
    }
    if summary.stabilization_rate > targets.stabilization_rate {
        recommendations.push("system frequently stabilizing; review input patterns".to_owned());
    }
    if summary.avg_dampening < targets.dampening {
        recommendations.push("dampening low; entropy may be over-constrained".to_owned());
    }
    if recommendations.is_empty() {
        recommendations.push("system operating within expected bounds".to_owned());
    }

    Advisory {
        status: AdvisoryStatus::Analyzed,
        observations: summary.observations,
        avg_entropy: Some(round_to(summary.avg_entropy, 4)),
        stabilization_rate: Some(round_to(summary.stabilization_rate, 3)),
        avg_dampening: Some(round_to(summary.avg_dampening, 3)),
        recommendations,
    }
}
