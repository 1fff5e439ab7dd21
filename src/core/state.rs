//! State trait and the governance mode of a session.
//!
//! A session is always in exactly one [`Mode`]. The mode is derived from the
//! session's cooldown flag; there are only two transitions between modes.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure - no side effects. States represent immutable
/// values that describe the current position in a state machine.
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// Hysteresis mode of a governance session.
///
/// - `Normal -> Cooldown` happens only when a checkpoint is forced.
/// - `Cooldown -> Normal` happens only when the tracker's exit test passes.
///
/// # Example
///
/// ```rust
/// use mindgate::core::{Mode, State};
///
/// assert_eq!(Mode::Normal.name(), "NORMAL");
/// assert_eq!(Mode::from_cooldown(true), Mode::Cooldown);
/// assert_eq!(Mode::Cooldown.name(), "COOLDOWN");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Normal,
    Cooldown,
}

impl Mode {
    /// Mode implied by a session's cooldown flag.
    pub fn from_cooldown(cooldown_active: bool) -> Self {
        if cooldown_active {
            Self::Cooldown
        } else {
            Self::Normal
        }
    }
}

impl State for Mode {
    fn name(&self) -> &str {
        match self {
            Self::Normal => "NORMAL",
            Self::Cooldown => "COOLDOWN",
        }
    }
}
