//! Error types for the fallible boundaries of the pipeline.
//!
//! Signal computation is total and never fails. Errors only arise where the
//! pipeline touches configuration, the instrumentation log, or checkpoints.

use crate::checkpoint::CheckpointError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the pipeline's I/O and configuration boundaries.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration failed validation or could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Instrumentation log could not be read or written
    #[error("Instrumentation log error at {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log record could not be encoded
    #[error("Failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Checkpoint save or resume failed
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl GateError {
    pub(crate) fn log(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Log {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type GateResult<T> = Result<T, GateError>;
