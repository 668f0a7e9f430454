//! Orchestration event model for streaming progress to observers.
//!
//! Events are the ordered contract between the orchestrator and whoever
//! renders it. Every event is folded into the [`OrchestrationState`] first,
//! then the new snapshot is published on a watch channel, and finally the
//! event itself is delivered on the (optional) event channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use wayfare_abstraction::Stage;

use crate::state::OrchestrationState;

/// Progress events emitted during an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    /// The stage's request is about to be issued.
    StageStarted { stage: Stage },

    /// New cumulative output for the stage.
    StageUpdate {
        stage: Stage,
        visible: String,
        /// Closed reasoning so far; `None` for untagged stages.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },

    /// The tagged stage's stream ended; no more reasoning will arrive.
    ReasoningComplete { stage: Stage },

    /// The stage's stream ended normally.
    StageCompleted { stage: Stage },

    /// The stage failed. No further events follow for it.
    StageFailed { stage: Stage, message: String },

    /// Every stage reached a terminal state.
    AllComplete,
}

impl OrchestrationEvent {
    /// The stage this event is about, if any.
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageStarted { stage }
            | Self::StageUpdate { stage, .. }
            | Self::ReasoningComplete { stage }
            | Self::StageCompleted { stage }
            | Self::StageFailed { stage, .. } => Some(*stage),
            Self::AllComplete => None,
        }
    }
}

/// The observer dropped its event receiver.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("observer dropped its event receiver")]
pub struct ObserverGone;

/// Applies events to the owned state and fans them out to observers.
pub struct EventPublisher {
    state: OrchestrationState,
    state_tx: watch::Sender<OrchestrationState>,
    events: Option<mpsc::Sender<OrchestrationEvent>>,
}

impl EventPublisher {
    /// Creates a publisher owning `state`.
    #[must_use]
    pub fn new(
        state: OrchestrationState,
        state_tx: watch::Sender<OrchestrationState>,
        events: Option<mpsc::Sender<OrchestrationEvent>>,
    ) -> Self {
        Self { state, state_tx, events }
    }

    /// Publishes one event.
    ///
    /// Waits until the event channel has room, so an update is delivered
    /// before the caller reads the next fragment. The state is only touched
    /// once room is reserved: dropping this future while it waits leaves
    /// both the state and the observer without the event.
    ///
    /// # Errors
    /// Returns [`ObserverGone`] if an event channel was given and its
    /// receiver has been dropped. The event is still folded into the state.
    pub async fn publish(&mut self, event: OrchestrationEvent) -> Result<(), ObserverGone> {
        let permit = match &self.events {
            Some(tx) => Some(tx.reserve().await),
            None => None,
        };

        self.state.apply(&event);
        self.state_tx.send_replace(self.state.clone());

        match permit {
            Some(Ok(permit)) => {
                permit.send(event);
                Ok(())
            }
            Some(Err(_)) => Err(ObserverGone),
            None => Ok(()),
        }
    }

    /// Marks the run abandoned and publishes the snapshot.
    pub fn abandon(&mut self) {
        self.state.mark_abandoned();
        self.state_tx.send_replace(self.state.clone());
    }

    /// Current state.
    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    /// Consumes the publisher, returning the final state.
    pub fn into_state(self) -> OrchestrationState {
        self.state
    }
}
