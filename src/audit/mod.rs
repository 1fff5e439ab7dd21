//! Audit trail: the instrumentation log, invariant verification over it, and
//! read-only metrics for operators.

mod instrumentation;
mod metrics;
mod verifier;

pub use instrumentation::{
    default_path, InstrumentationLog, LoadedLog, LogRecord, RepairReport, DEFAULT_LOG_FILE,
    LOG_ENV_VAR,
};
pub use metrics::{
    advise, recent, recent_view, summarize, trend, Advisory, AdvisoryStatus, AdvisoryTargets,
    MetricsSummary, RecentView, Trend, RECENT_WINDOW,
};
pub use verifier::{InvariantVerifier, LogInvariant, VerificationReport, Violation};
