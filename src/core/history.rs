//! Mode transition history.
//!
//! Records every NORMAL/COOLDOWN transition of a session, keyed by the turn
//! on which it happened.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use mindgate::core::{Mode, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Mode::Normal,
///     to: Mode::Cooldown,
///     timestamp: Utc::now(),
///     turn: 4,
/// };
/// assert_eq!(transition.turn, 4);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// Session turn on which the transition occurred
    pub turn: u64,
}

/// Ordered history of state transitions.
///
/// History is immutable - `record` returns a new history with the
/// transition added.
///
/// # Example
///
/// ```rust
/// use mindgate::core::{Mode, StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new()
///     .record(StateTransition {
///         from: Mode::Normal,
///         to: Mode::Cooldown,
///         timestamp: Utc::now(),
///         turn: 3,
///     })
///     .record(StateTransition {
///         from: Mode::Cooldown,
///         to: Mode::Normal,
///         timestamp: Utc::now(),
///         turn: 6,
///     });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![&Mode::Normal, &Mode::Cooldown, &Mode::Normal]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Get the path of states traversed.
    ///
    /// Returns the first transition's `from`, then the `to` of each transition.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Most recent transition, if any.
    pub fn last(&self) -> Option<&StateTransition<S>> {
        self.transitions.last()
    }

    /// Get all transitions in order.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }
}
