//! Strictly sequential execution of the configured stages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wayfare_abstraction::{RecommendationTransport, Stage, StageRequest};

use crate::config::{ConfigError, OrchestratorConfig};
use crate::events::{EventPublisher, OrchestrationEvent};
use crate::runner::StageRunner;
use crate::stage::StageOutcome;
use crate::state::OrchestrationState;

/// Builds the request for each stage.
pub trait RequestFactory: Send + Sync {
    /// Request to issue for `stage`.
    fn request_for(&self, stage: Stage) -> StageRequest;
}

impl<F> RequestFactory for F
where
    F: Fn(Stage) -> StageRequest + Send + Sync,
{
    fn request_for(&self, stage: Stage) -> StageRequest {
        self(stage)
    }
}

/// Requests for one trip, tagged according to the configuration.
#[derive(Debug, Clone)]
pub struct TripRequestFactory {
    trip_id: String,
    config: OrchestratorConfig,
}

impl TripRequestFactory {
    /// Creates a factory for `trip_id`.
    #[must_use]
    pub fn new(trip_id: impl Into<String>, config: &OrchestratorConfig) -> Self {
        Self { trip_id: trip_id.into(), config: config.clone() }
    }
}

impl RequestFactory for TripRequestFactory {
    fn request_for(&self, stage: Stage) -> StageRequest {
        StageRequest::new(self.trip_id.clone(), stage, self.config.is_tagged(stage))
    }
}

/// Runs every configured stage one after another.
///
/// Stage k+1 is requested only after stage k has completed or failed, and
/// its body stream has been dropped. A failed stage never stops the run;
/// cancellation or a dropped event receiver does.
pub struct Sequencer {
    transport: Arc<dyn RecommendationTransport>,
    factory: Box<dyn RequestFactory>,
    stages: Vec<Stage>,
    stage_timeout: Option<Duration>,
    event_buffer: usize,
    cancel: CancellationToken,
    state_tx: watch::Sender<OrchestrationState>,
}

impl Sequencer {
    /// Creates a sequencer for `trip_id`.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] from [`OrchestratorConfig::validate`].
    pub fn new(
        transport: Arc<dyn RecommendationTransport>,
        trip_id: impl Into<String>,
        config: &OrchestratorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let trip_id = trip_id.into();
        let (state_tx, _) = watch::channel(OrchestrationState::new(trip_id.clone(), &config.stages));
        Ok(Self {
            transport,
            factory: Box::new(TripRequestFactory::new(trip_id, config)),
            stages: config.stages.clone(),
            stage_timeout: config.stage_timeout(),
            event_buffer: config.event_buffer,
            cancel: CancellationToken::new(),
            state_tx,
        })
    }

    /// Replaces the request factory.
    #[must_use]
    pub fn with_request_factory(mut self, factory: impl RequestFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Overrides the per-stage timeout from the configuration.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Token that abandons the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<OrchestrationState> {
        self.state_tx.subscribe()
    }

    /// Runs all stages and returns the final state.
    ///
    /// When `events` is given, every event is delivered on it in order and
    /// the run is abandoned as soon as its receiver is dropped.
    pub async fn run(self, events: Option<mpsc::Sender<OrchestrationEvent>>) -> OrchestrationState {
        let state = self.state_tx.borrow().clone();
        let trip_id = state.trip_id.clone();
        let mut publisher = EventPublisher::new(state, self.state_tx, events);

        let runner = StageRunner::new(self.transport.as_ref())
            .with_timeout(self.stage_timeout)
            .with_cancellation(self.cancel.clone());

        info!(trip_id = %trip_id, stages = self.stages.len(), "Orchestration started");

        let mut failed = 0usize;
        for stage in &self.stages {
            let request = self.factory.request_for(*stage);
            match runner.run(&request, &mut publisher).await {
                StageOutcome::Complete => {}
                StageOutcome::Failed(_) => failed += 1,
                StageOutcome::Abandoned => {
                    warn!(trip_id = %trip_id, stage = %stage, "Orchestration abandoned");
                    publisher.abandon();
                    return publisher.into_state();
                }
            }
        }

        if publisher.publish(OrchestrationEvent::AllComplete).await.is_err() {
            // Every stage is terminal already; only the delivery was lost.
            warn!(trip_id = %trip_id, "Observer gone before AllComplete was delivered");
        }
        info!(trip_id = %trip_id, failed, "Orchestration complete");
        publisher.into_state()
    }

    /// Spawns the run on the current runtime.
    ///
    /// Dropping the returned receiver abandons the run.
    pub fn start(self) -> (JoinHandle<OrchestrationState>, mpsc::Receiver<OrchestrationEvent>) {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let handle = tokio::spawn(self.run(Some(tx)));
        (handle, rx)
    }
}
