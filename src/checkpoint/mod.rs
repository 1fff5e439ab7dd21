//! Session checkpoints.
//!
//! A checkpoint captures everything a pipeline needs to carry on after a
//! restart: configuration, tracker state, the entropy window and the mode
//! history. Histories serialize as plain ordered arrays.

use crate::config::PipelineConfig;
use crate::core::{BoundedRing, Mode, StateHistory};
use crate::signals::Snapshot;
use crate::tracker::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::CheckpointError;

/// Version identifier for the checkpoint format.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one governance session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier (UUID v4)
    pub id: String,

    /// When the checkpoint was taken
    pub timestamp: DateTime<Utc>,

    pub config: PipelineConfig,

    pub state: SessionState,

    /// Per-turn entropies in the gate's smoothing window, oldest first
    pub entropy_window: BoundedRing<f64>,

    /// Gate reading of the last observed turn
    pub last_snapshot: Option<Snapshot>,

    pub history: StateHistory<Mode>,
}

impl SessionCheckpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(CheckpointError::encode)
    }

    /// Parse and version-check a JSON checkpoint.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json).map_err(CheckpointError::decode)?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(CheckpointError::encode)
    }

    /// Decode and version-check a binary checkpoint.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes).map_err(CheckpointError::decode)?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Version and configuration checks run before resuming.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        self.check_version()?;
        self.config
            .validate()
            .map_err(|e| CheckpointError::ValidationFailed(e.to_string()))
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}
