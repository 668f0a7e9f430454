//! Execution of a single stage.
//!
//! A [`StageRunner`] issues one request, feeds its body through a
//! [`ChunkSource`], rebuilds the stage's view after every fragment and
//! publishes it before asking for the next one. It never retries.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wayfare_abstraction::{RecommendationTransport, StageRequest};

use crate::chunk_source::ChunkSource;
use crate::error::StageError;
use crate::events::{EventPublisher, OrchestrationEvent};
use crate::parser::{ParsedView, TagStreamParser};
use crate::stage::StageOutcome;

/// Why streaming stopped before the body ended.
enum Interrupt {
    Failed(StageError),
    Abandoned,
}

/// Runs one stage against a transport.
pub struct StageRunner<'a> {
    transport: &'a dyn RecommendationTransport,
    parser: TagStreamParser,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<'a> StageRunner<'a> {
    /// Creates a runner with no timeout and a fresh cancellation token.
    #[must_use]
    pub fn new(transport: &'a dyn RecommendationTransport) -> Self {
        Self { transport, parser: TagStreamParser::new(), timeout: None, cancel: CancellationToken::new() }
    }

    /// Bounds the time each stage spends waiting on the transport.
    ///
    /// The request and every body read count against the deadline; time
    /// spent waiting for the observer to take an event does not.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abandons the stage when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the stage to a terminal state.
    ///
    /// Publishes `StageStarted`, one `StageUpdate` per fragment, then either
    /// `ReasoningComplete` (tagged only) and `StageCompleted`, or a single
    /// `StageFailed`. The body stream is dropped before this returns on
    /// every path.
    pub async fn run(&self, request: &StageRequest, publisher: &mut EventPublisher) -> StageOutcome {
        let stage = request.stage;

        if publisher.publish(OrchestrationEvent::StageStarted { stage }).await.is_err() {
            return StageOutcome::Abandoned;
        }
        info!(trip_id = %request.trip_id, stage = %stage, tagged = request.tagged, "Stage started");

        let deadline = self.timeout.map(|t| Instant::now() + t);
        match self.stream(request, publisher, deadline).await {
            Ok(()) => {
                info!(trip_id = %request.trip_id, stage = %stage, "Stage complete");
                StageOutcome::Complete
            }
            Err(Interrupt::Failed(error)) => {
                warn!(trip_id = %request.trip_id, stage = %stage, error = %error, "Stage failed");
                let event = OrchestrationEvent::StageFailed { stage, message: error.to_string() };
                if publisher.publish(event).await.is_err() {
                    return StageOutcome::Abandoned;
                }
                StageOutcome::Failed(error)
            }
            Err(Interrupt::Abandoned) => {
                info!(trip_id = %request.trip_id, stage = %stage, "Stage abandoned");
                StageOutcome::Abandoned
            }
        }
    }

    async fn stream(
        &self,
        request: &StageRequest,
        publisher: &mut EventPublisher,
        deadline: Option<Instant>,
    ) -> Result<(), Interrupt> {
        let stage = request.stage;

        let body = self
            .guard(deadline, self.transport.open_stream(request))
            .await?
            .map_err(|e| Interrupt::Failed(e.into()))?;

        let mut source = ChunkSource::new(body);
        let mut raw = String::new();
        let mut last_view: Option<ParsedView> = None;

        while let Some(fragment) = self.guard(deadline, source.next()).await? {
            let fragment = fragment.map_err(Interrupt::Failed)?;
            raw.push_str(&fragment);
            debug!(stage = %stage, fragment_len = fragment.len(), buffer_len = raw.len(), "Fragment received");

            let event = if request.tagged {
                let view = self.parser.update(&raw);
                let event = OrchestrationEvent::StageUpdate {
                    stage,
                    visible: view.visible.clone(),
                    reasoning: Some(view.reasoning.clone()),
                };
                last_view = Some(view);
                event
            } else {
                OrchestrationEvent::StageUpdate { stage, visible: raw.clone(), reasoning: None }
            };
            self.deliver(publisher, event).await?;
        }
        debug!(stage = %stage, bytes = source.bytes_read(), "Stream ended");
        drop(source);

        if request.tagged {
            if last_view.as_ref().is_some_and(ParsedView::has_open_reasoning) {
                warn!(stage = %stage, "Stream ended inside an unterminated reasoning span");
            }
            self.deliver(publisher, OrchestrationEvent::ReasoningComplete { stage }).await?;
        }
        self.deliver(publisher, OrchestrationEvent::StageCompleted { stage }).await
    }

    /// Publishes without a deadline; only cancellation interrupts the wait.
    async fn deliver(&self, publisher: &mut EventPublisher, event: OrchestrationEvent) -> Result<(), Interrupt> {
        self.guard(None, publisher.publish(event)).await?.map_err(|_| Interrupt::Abandoned)
    }

    /// Races `fut` against cancellation and the stage deadline, if any.
    async fn guard<F: Future>(&self, deadline: Option<Instant>, fut: F) -> Result<F::Output, Interrupt> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupt::Abandoned),
            () = sleep_until(deadline) => {
                Err(Interrupt::Failed(StageError::Timeout(self.timeout.unwrap_or_default())))
            }
            out = fut => Ok(out),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
