//! Per-run state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one run
///
/// `Pending -> Running(0) -> Running(1) -> ... -> {Succeeded | Failed | Errored}`.
/// Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    /// Executing the stage at this index
    Running(usize),
    Succeeded,
    Failed,
    Errored,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }

    /// Checks whether moving to `next` is allowed
    ///
    /// Stages advance one at a time; any non-terminal state may end in a
    /// terminal one (an unexpected error can happen before the first stage).
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running(0)) => true,
            (Self::Running(i), Self::Running(j)) => j == i + 1,
            (Self::Pending | Self::Running(_), Self::Succeeded | Self::Failed | Self::Errored) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running(stage) => write!(f, "running stage {}", stage),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}
