//! Mindgate: measured governance signals for conversational text
//!
//! Mindgate turns a stream of text turns into bounded pressure signals and
//! uses them to gate downstream behavior. Signal computation is a pure core;
//! the only side effects are the optional instrumentation log and checkpoint
//! encoding at the edges.
//!
//! # Core Concepts
//!
//! - **Entropy gate**: smoothed lexical diversity with a stabilize constraint
//! - **Coherence and recursion**: per-turn K and R heuristics
//! - **State tracker**: rolling histories, slope, cooldown hysteresis and a
//!   reproducible trace hash
//! - **Segmentation**: forced checkpoints on accelerating or saturated collapse
//! - **Actuation**: confidence scoring and fail-closed decision gates
//! - **Audit**: an append-only JSONL log, invariant verification and metrics
//!
//! # Example
//!
//! ```rust
//! use mindgate::{InvariantStatus, Mode, Pipeline, PipelineConfig, Verdict};
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//!
//! let outcome = pipeline.observe("A calm, complete sentence.").unwrap();
//! assert_eq!(outcome.metrics.turn, 1);
//! assert_eq!(pipeline.mode(), Mode::Normal);
//!
//! // Nothing acts on unverified invariants.
//! let decision = pipeline.decide(InvariantStatus::Unverifiable, None);
//! assert_eq!(decision.decision, Verdict::Deny);
//! ```

pub mod actuation;
pub mod audit;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod segmentation;
pub mod signals;
pub mod tracker;

// Re-export commonly used types
pub use actuation::{Decision, InvariantStatus, PolicySnapshot, Verdict};
pub use audit::{InstrumentationLog, InvariantVerifier, VerificationReport};
pub use checkpoint::{CheckpointError, SessionCheckpoint};
pub use config::PipelineConfig;
pub use crate::core::{Mode, State};
pub use error::{GateError, GateResult};
pub use pipeline::{Pipeline, TurnOutcome};
pub use segmentation::{SeedPack, SegmentationDecider};
pub use signals::{EntropyGate, Snapshot};
pub use tracker::{SessionState, StateTracker, TurnMetrics};
