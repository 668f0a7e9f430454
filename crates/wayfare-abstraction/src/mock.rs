//! Scripted transport for tests and demos.
//!
//! Each stage gets a canned reply: either a refusal (the request fails
//! before a body exists) or a body made of [`MockStep`]s. Every open and
//! every body release is recorded so tests can check ordering and that
//! stream handles are dropped on all exit paths.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::{ByteStream, RecommendationTransport, Stage, StageRequest, TransportError};

/// One step of a scripted body.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Deliver these bytes as one chunk.
    Chunk(Bytes),
    /// Fail the read with a stream error.
    Fail(String),
    /// Never produce another item.
    Hang,
}

/// Canned reply for one stage.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// The request succeeds and the body plays these steps, then ends.
    Body(Vec<MockStep>),
    /// The request itself fails.
    Refuse(TransportError),
}

/// Something that happened to a scripted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamActivity {
    /// A request for the stage was issued.
    Opened(Stage),
    /// The stage's body stream was dropped.
    Released(Stage),
}

/// A mock implementation of [`RecommendationTransport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<Stage, MockReply>>,
    activity: Arc<Mutex<Vec<StreamActivity>>>,
}

impl MockTransport {
    /// Creates a transport with no replies; unscripted stages answer 404.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the reply for `stage`.
    #[must_use]
    pub fn with_reply(self, stage: Stage, reply: MockReply) -> Self {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).insert(stage, reply);
        self
    }

    /// Scripts a body that delivers each fragment as its own chunk.
    #[must_use]
    pub fn with_fragments(self, stage: Stage, fragments: &[&str]) -> Self {
        let steps = fragments
            .iter()
            .map(|f| MockStep::Chunk(Bytes::copy_from_slice(f.as_bytes())))
            .collect();
        self.with_reply(stage, MockReply::Body(steps))
    }

    /// Scripts a body from raw byte chunks.
    #[must_use]
    pub fn with_chunks(self, stage: Stage, chunks: Vec<Vec<u8>>) -> Self {
        let steps = chunks.into_iter().map(|c| MockStep::Chunk(Bytes::from(c))).collect();
        self.with_reply(stage, MockReply::Body(steps))
    }

    /// Scripts a request failure for `stage`.
    #[must_use]
    pub fn with_refusal(self, stage: Stage, error: TransportError) -> Self {
        self.with_reply(stage, MockReply::Refuse(error))
    }

    /// Everything recorded so far, in order.
    pub fn activity(&self) -> Vec<StreamActivity> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stages that were requested, in order.
    pub fn requested(&self) -> Vec<Stage> {
        self.activity()
            .into_iter()
            .filter_map(|a| match a {
                StreamActivity::Opened(stage) => Some(stage),
                StreamActivity::Released(_) => None,
            })
            .collect()
    }

    fn record(&self, entry: StreamActivity) {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }
}

#[async_trait]
impl RecommendationTransport for MockTransport {
    async fn open_stream(&self, request: &StageRequest) -> Result<ByteStream, TransportError> {
        self.record(StreamActivity::Opened(request.stage));

        let reply = self.replies.lock().unwrap_or_else(PoisonError::into_inner).remove(&request.stage);
        match reply {
            Some(MockReply::Body(steps)) => Ok(Box::pin(ScriptedBody {
                stage: request.stage,
                steps: steps.into(),
                activity: Arc::clone(&self.activity),
            })),
            Some(MockReply::Refuse(error)) => Err(error),
            None => Err(TransportError::Status { status: 404, body: "no scripted reply".to_string() }),
        }
    }
}

struct ScriptedBody {
    stage: Stage,
    steps: VecDeque<MockStep>,
    activity: Arc<Mutex<Vec<StreamActivity>>>,
}

impl Stream for ScriptedBody {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.steps.pop_front() {
            Some(MockStep::Chunk(bytes)) => Poll::Ready(Some(Ok(bytes))),
            Some(MockStep::Fail(message)) => Poll::Ready(Some(Err(TransportError::Stream(message)))),
            Some(MockStep::Hang) => {
                self.steps.push_front(MockStep::Hang);
                Poll::Pending
            }
            None => Poll::Ready(None),
        }
    }
}

impl Drop for ScriptedBody {
    fn drop(&mut self) {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StreamActivity::Released(self.stage));
    }
}
