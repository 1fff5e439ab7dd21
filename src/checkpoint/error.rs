//! Errors raised while saving or resuming a session checkpoint.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint could not be encoded as JSON or binary
    #[error("Checkpoint encoding failed: {0}")]
    SerializationFailed(String),

    /// The bytes or text given were not a checkpoint
    #[error("Checkpoint decoding failed: {0}")]
    DeserializationFailed(String),

    /// Written by a newer or older format than this build reads
    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Decoded fine but carries a configuration or state that cannot resume
    #[error("Checkpoint rejected: {0}")]
    ValidationFailed(String),
}

impl CheckpointError {
    pub(crate) fn encode<E: fmt::Display>(err: E) -> Self {
        Self::SerializationFailed(err.to_string())
    }

    pub(crate) fn decode<E: fmt::Display>(err: E) -> Self {
        Self::DeserializationFailed(err.to_string())
    }
}
