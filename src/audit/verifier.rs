//! Post-hoc invariant verification over the instrumentation log.
//!
//! Every record is checked against every invariant and all violations are
//! accumulated with `Validation` rather than stopping at the first one.

use super::instrumentation::InstrumentationLog;
use crate::actuation::InvariantStatus;
use crate::error::GateResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Named contract every log record must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogInvariant {
    /// `entropy` within `[0, 1]`
    EntropyBound,
    /// `mean_entropy` within `[0, 1]`
    MeanEntropyBound,
    /// `dampening` within `(0, 1]`
    DampeningRange,
    /// `identity_pressure` is recorded
    NoIdentityWrite,
    /// `active_constraints` is an explicit list
    ConstraintsExplicit,
}

impl LogInvariant {
    pub const ALL: [LogInvariant; 5] = [
        Self::EntropyBound,
        Self::MeanEntropyBound,
        Self::DampeningRange,
        Self::NoIdentityWrite,
        Self::ConstraintsExplicit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::EntropyBound => "entropy_bound",
            Self::MeanEntropyBound => "mean_entropy_bound",
            Self::DampeningRange => "dampening_range",
            Self::NoIdentityWrite => "no_identity_write",
            Self::ConstraintsExplicit => "constraints_explicit",
        }
    }

    /// `Ok(holds)` when the record could be evaluated, `Err(detail)` when it
    /// could not.
    fn evaluate(self, record: &Value) -> Result<bool, String> {
        let fields = record
            .as_object()
            .ok_or_else(|| "record is not an object".to_string())?;
        let number = |key: &str| -> Result<f64, String> {
            let value = fields
                .get(key)
                .ok_or_else(|| format!("missing field `{key}`"))?;
            value
                .as_f64()
                .ok_or_else(|| format!("field `{key}` is not a number"))
        };

        match self {
            Self::EntropyBound => number("entropy").map(|e| (0.0..=1.0).contains(&e)),
            Self::MeanEntropyBound => number("mean_entropy").map(|e| (0.0..=1.0).contains(&e)),
            Self::DampeningRange => number("dampening").map(|d| d > 0.0 && d <= 1.0),
            Self::NoIdentityWrite => Ok(fields.contains_key("identity_pressure")),
            Self::ConstraintsExplicit => {
                Ok(fields.get("active_constraints").is_some_and(Value::is_array))
            }
        }
    }
}

impl fmt::Display for LogInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One failed `(record, invariant)` pair.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[error("record {record}: {invariant}")]
pub struct Violation {
    /// Zero-based position among the parsed log entries
    pub record: usize,
    pub invariant: LogInvariant,
    /// Set when the record could not be evaluated at all
    pub detail: Option<String>,
}

/// Result of a full verification pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub status: InvariantStatus,
    pub records_checked: usize,
    pub invariant_count: usize,
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.status.is_clean()
    }
}

/// Checks log records against a fixed set of invariants.
#[derive(Clone, Debug)]
pub struct InvariantVerifier {
    invariants: Vec<LogInvariant>,
}

impl Default for InvariantVerifier {
    fn default() -> Self {
        Self {
            invariants: LogInvariant::ALL.to_vec(),
        }
    }
}

impl InvariantVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invariants(&self) -> &[LogInvariant] {
        &self.invariants
    }

    /// Load `log` and verify everything in it.
    pub fn verify(&self, log: &InstrumentationLog) -> GateResult<VerificationReport> {
        let loaded = log.load()?;
        Ok(self.verify_entries(&loaded.entries))
    }

    /// Verify already-loaded entries.
    ///
    /// An empty slice is unverifiable rather than clean.
    pub fn verify_entries(&self, entries: &[Value]) -> VerificationReport {
        let (status, violations) = if entries.is_empty() {
            (InvariantStatus::Unverifiable, Vec::new())
        } else {
            match self.validate(entries) {
                Validation::Success(_) => (InvariantStatus::Clean, Vec::new()),
                Validation::Failure(errors) => {
                    (InvariantStatus::Violated, errors.iter().cloned().collect())
                }
            }
        };

        if status != InvariantStatus::Clean {
            tracing::warn!(
                status = %status,
                violations = violations.len(),
                records = entries.len(),
                "Invariant verification did not come back clean"
            );
        }

        VerificationReport {
            status,
            records_checked: entries.len(),
            invariant_count: self.invariants.len(),
            violations,
        }
    }

    /// Every `(record, invariant)` check, accumulating ALL violations.
    pub fn validate(&self, entries: &[Value]) -> Validation<(), NonEmptyVec<Violation>> {
        let checks: Vec<Validation<(), NonEmptyVec<Violation>>> = entries
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| {
                self.invariants
                    .iter()
                    .map(move |invariant| check(index, *invariant, entry))
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }
}

fn check(
    record: usize,
    invariant: LogInvariant,
    entry: &Value,
) -> Validation<(), NonEmptyVec<Violation>> {
    match invariant.evaluate(entry) {
        Ok(true) => Validation::success(()),
        Ok(false) => Validation::fail(Violation {
            record,
            invariant,
            detail: None,
        }),
        Err(detail) => Validation::fail(Violation {
            record,
            invariant,
            detail: Some(detail),
        }),
    }
}
