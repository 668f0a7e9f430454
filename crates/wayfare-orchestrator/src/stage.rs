//! Stage lifecycle.

use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Lifecycle status of one stage within an orchestration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Request issued, body being read.
    Streaming,
    /// Body read to the end.
    Complete,
    /// Request or read failed.
    Failed,
}

impl StageStatus {
    /// Checks if the stage can move to `to`.
    ///
    /// Stages only move forward and never leave a terminal state.
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Streaming) | (Self::Streaming, Self::Complete | Self::Failed)
        )
    }

    /// Complete or Failed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// How a stage run ended, as seen by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The body was read to the end.
    Complete,
    /// The stage failed; the sequence continues.
    Failed(StageError),
    /// The observer went away or the run was cancelled; nothing more runs.
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(StageStatus::Pending.can_transition_to(StageStatus::Streaming));
        assert!(StageStatus::Streaming.can_transition_to(StageStatus::Complete));
        assert!(StageStatus::Streaming.can_transition_to(StageStatus::Failed));
    }

    #[test]
    fn test_terminal_states_are_never_revisited() {
        for terminal in [StageStatus::Complete, StageStatus::Failed] {
            assert!(terminal.is_terminal());
            for to in [StageStatus::Pending, StageStatus::Streaming, StageStatus::Complete, StageStatus::Failed] {
                assert!(!terminal.can_transition_to(to), "{terminal:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn test_no_skipping_streaming() {
        assert!(!StageStatus::Pending.can_transition_to(StageStatus::Complete));
        assert!(!StageStatus::Pending.can_transition_to(StageStatus::Failed));
        assert!(!StageStatus::Streaming.can_transition_to(StageStatus::Pending));
    }
}
