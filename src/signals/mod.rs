//! Per-turn pressure signals derived from raw text.
//!
//! - [`EntropyGate`]: smoothed lexical diversity and the stabilize constraint
//! - Coherence (K) and recursion pressure (R) estimators
//!
//! All functions here are total: any text, including empty text, yields a
//! value in `[0, 1]`.

mod coherence;
mod entropy;

pub use coherence::{estimate_coherence, estimate_recursion, has_repeated_run, tokenize};
pub use entropy::{measure_entropy, Constraint, EntropyGate, Snapshot};
