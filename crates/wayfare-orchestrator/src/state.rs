//! Orchestration state as seen by observers.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::warn;
use wayfare_abstraction::Stage;

use crate::events::OrchestrationEvent;
use crate::stage::StageStatus;

/// Where the sequencer is in its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum SequencerPhase {
    /// Nothing started yet.
    #[default]
    Idle,
    /// The stage is streaming.
    Streaming(Stage),
    /// The stage reached Complete or Failed; the next one has not started.
    Terminal(Stage),
    /// Every stage reached a terminal state.
    AllComplete,
    /// The observer went away or the run was cancelled.
    Abandoned,
}

/// Latest known output of one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    /// Lifecycle status.
    pub status: StageStatus,
    /// Text to show for the stage.
    pub visible: String,
    /// Closed reasoning text, tagged stages only.
    pub reasoning: Option<String>,
    /// Failure message once the stage failed.
    pub error: Option<String>,
}

impl StageEntry {
    /// What to show in place of the stage's content.
    ///
    /// A failed stage shows `Error: <message>`; the partial text it had
    /// received is kept in `visible` untouched.
    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.error {
            Some(message) => Cow::Owned(format!("Error: {message}")),
            None => Cow::Borrowed(&self.visible),
        }
    }

    fn transition(&mut self, stage: Stage, to: StageStatus) -> bool {
        if self.status.can_transition_to(to) {
            self.status = to;
            true
        } else {
            warn!(stage = %stage, from = ?self.status, to = ?to, "Ignoring invalid stage transition");
            false
        }
    }
}

/// One entry per stage plus the two completion flags.
///
/// Only the sequencer mutates this, through [`OrchestrationState::apply`];
/// observers get clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationState {
    /// Trip being planned.
    pub trip_id: String,
    /// Sequencer phase.
    pub phase: SequencerPhase,
    /// True once the tagged stage's stream has ended.
    pub reasoning_complete: bool,
    /// True once the last stage has reached a terminal state.
    pub all_complete: bool,
    entries: Vec<(Stage, StageEntry)>,
}

impl OrchestrationState {
    /// Fresh state with every stage pending.
    #[must_use]
    pub fn new(trip_id: impl Into<String>, stages: &[Stage]) -> Self {
        Self {
            trip_id: trip_id.into(),
            phase: SequencerPhase::Idle,
            reasoning_complete: false,
            all_complete: false,
            entries: stages.iter().map(|s| (*s, StageEntry::default())).collect(),
        }
    }

    /// Entry for `stage`, if the stage is part of this run.
    pub fn entry(&self, stage: Stage) -> Option<&StageEntry> {
        self.entries.iter().find(|(s, _)| *s == stage).map(|(_, e)| e)
    }

    /// Entries in execution order.
    pub fn entries(&self) -> impl Iterator<Item = (Stage, &StageEntry)> {
        self.entries.iter().map(|(s, e)| (*s, e))
    }

    /// Folds one event into the state.
    ///
    /// A stage that is already Complete or Failed is never changed again.
    pub fn apply(&mut self, event: &OrchestrationEvent) {
        match event {
            OrchestrationEvent::StageStarted { stage } => {
                self.entry_mut(*stage).transition(*stage, StageStatus::Streaming);
                self.phase = SequencerPhase::Streaming(*stage);
            }
            OrchestrationEvent::StageUpdate { stage, visible, reasoning } => {
                let entry = self.entry_mut(*stage);
                if entry.status.is_terminal() {
                    warn!(stage = %stage, status = ?entry.status, "Ignoring update for a finished stage");
                    return;
                }
                entry.visible.clone_from(visible);
                entry.reasoning.clone_from(reasoning);
            }
            OrchestrationEvent::ReasoningComplete { .. } => {
                self.reasoning_complete = true;
            }
            OrchestrationEvent::StageCompleted { stage } => {
                self.entry_mut(*stage).transition(*stage, StageStatus::Complete);
                self.phase = SequencerPhase::Terminal(*stage);
            }
            OrchestrationEvent::StageFailed { stage, message } => {
                let entry = self.entry_mut(*stage);
                if entry.transition(*stage, StageStatus::Failed) {
                    entry.error = Some(message.clone());
                    self.phase = SequencerPhase::Terminal(*stage);
                }
            }
            OrchestrationEvent::AllComplete => {
                self.all_complete = true;
                self.phase = SequencerPhase::AllComplete;
            }
        }
    }

    pub(crate) fn mark_abandoned(&mut self) {
        self.phase = SequencerPhase::Abandoned;
    }

    fn entry_mut(&mut self, stage: Stage) -> &mut StageEntry {
        let index = match self.entries.iter().position(|(s, _)| *s == stage) {
            Some(index) => index,
            None => {
                self.entries.push((stage, StageEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> OrchestrationState {
        OrchestrationState::new("trip-1", &Stage::ALL)
    }

    #[test]
    fn test_new_state_is_idle_and_pending() {
        let state = state();
        assert_eq!(state.phase, SequencerPhase::Idle);
        assert!(!state.reasoning_complete);
        assert!(!state.all_complete);
        assert!(state.entries().all(|(_, e)| e.status == StageStatus::Pending));
        let order: Vec<Stage> = state.entries().map(|(s, _)| s).collect();
        assert_eq!(order, Stage::ALL.to_vec());
    }

    #[test]
    fn test_apply_stage_lifecycle() {
        let mut state = state();
        state.apply(&OrchestrationEvent::StageStarted { stage: Stage::Lodging });
        assert_eq!(state.phase, SequencerPhase::Streaming(Stage::Lodging));

        state.apply(&OrchestrationEvent::StageUpdate {
            stage: Stage::Lodging,
            visible: "Stay".to_string(),
            reasoning: Some("why".to_string()),
        });
        state.apply(&OrchestrationEvent::ReasoningComplete { stage: Stage::Lodging });
        state.apply(&OrchestrationEvent::StageCompleted { stage: Stage::Lodging });

        let entry = state.entry(Stage::Lodging).unwrap();
        assert_eq!(entry.status, StageStatus::Complete);
        assert_eq!(entry.display_text(), "Stay");
        assert_eq!(entry.reasoning.as_deref(), Some("why"));
        assert!(state.reasoning_complete);
        assert_eq!(state.phase, SequencerPhase::Terminal(Stage::Lodging));
    }

    #[test]
    fn test_failed_stage_keeps_partial_text() {
        let mut state = state();
        state.apply(&OrchestrationEvent::StageStarted { stage: Stage::Food });
        state.apply(&OrchestrationEvent::StageUpdate {
            stage: Stage::Food,
            visible: "Eat at".to_string(),
            reasoning: None,
        });
        state.apply(&OrchestrationEvent::StageFailed {
            stage: Stage::Food,
            message: "connection reset".to_string(),
        });

        let entry = state.entry(Stage::Food).unwrap();
        assert_eq!(entry.status, StageStatus::Failed);
        assert_eq!(entry.visible, "Eat at");
        assert_eq!(entry.display_text(), "Error: connection reset");
    }

    #[test]
    fn test_terminal_status_not_reopened() {
        let mut state = state();
        state.apply(&OrchestrationEvent::StageStarted { stage: Stage::Travel });
        state.apply(&OrchestrationEvent::StageCompleted { stage: Stage::Travel });
        state.apply(&OrchestrationEvent::StageStarted { stage: Stage::Travel });
        assert_eq!(state.entry(Stage::Travel).unwrap().status, StageStatus::Complete);
    }

    #[test]
    fn test_finished_stage_ignores_late_update_and_failure() {
        let mut state = state();
        state.apply(&OrchestrationEvent::StageStarted { stage: Stage::Food });
        state.apply(&OrchestrationEvent::StageUpdate {
            stage: Stage::Food,
            visible: "Eat".to_string(),
            reasoning: None,
        });
        state.apply(&OrchestrationEvent::StageCompleted { stage: Stage::Food });

        state.apply(&OrchestrationEvent::StageUpdate {
            stage: Stage::Food,
            visible: "other".to_string(),
            reasoning: None,
        });
        state.apply(&OrchestrationEvent::StageFailed { stage: Stage::Food, message: "HTTP 404".to_string() });

        let entry = state.entry(Stage::Food).unwrap();
        assert_eq!(entry.status, StageStatus::Complete);
        assert_eq!(entry.visible, "Eat");
        assert_eq!(entry.error, None);
        assert_eq!(entry.display_text(), "Eat");
    }

    #[test]
    fn test_entries_keep_run_order() {
        let state = OrchestrationState::new("trip-1", &[Stage::Travel, Stage::Lodging]);
        let order: Vec<Stage> = state.entries().map(|(s, _)| s).collect();
        assert_eq!(order, vec![Stage::Travel, Stage::Lodging]);
        assert!(state.entry(Stage::Food).is_none());
    }

    #[test]
    fn test_all_complete() {
        let mut state = state();
        state.apply(&OrchestrationEvent::AllComplete);
        assert!(state.all_complete);
        assert_eq!(state.phase, SequencerPhase::AllComplete);
    }
}
