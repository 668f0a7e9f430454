//! Transport abstraction layer for Wayfare.
//!
//! This crate defines the stage identities, the trip contract and the
//! [`RecommendationTransport`] trait through which the orchestrator reaches
//! the remote recommender. Concrete transports live in `wayfare-http`; a
//! scripted [`mock::MockTransport`] is provided for tests and demos.

pub mod mock;
pub mod plan;

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use plan::{TripPlan, TripSummary};

/// Represents an error that can occur while talking to the recommender backend.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportError {
    /// The request could not be sent (connection refused, DNS, TLS, ...).
    #[error("Request Error: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}{}", if body.is_empty() { String::new() } else { format!(": {body}") })]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body failed while it was being read.
    #[error("Stream Error: {0}")]
    Stream(String),

    /// A JSON body could not be encoded or decoded.
    #[error("Serialization Error: {0}")]
    Serialization(String),

    /// The configured base URL cannot be used to build request URLs.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// A response body as an ordered sequence of raw byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// One of the three recommendation categories, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Where to stay.
    Lodging,
    /// Where and what to eat.
    Food,
    /// Getting around.
    Travel,
}

impl Stage {
    /// All stages in their fixed execution order.
    pub const ALL: [Self; 3] = [Self::Lodging, Self::Food, Self::Travel];

    /// Wire name used in the recommendation URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lodging => "lodging",
            Self::Food => "food",
            Self::Travel => "travel",
        }
    }

    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Lodging => "Lodging Recommendations",
            Self::Food => "Food & Dining",
            Self::Travel => "Travel & Transportation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Stage`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stage '{0}' (expected lodging, food or travel)")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lodging" => Ok(Self::Lodging),
            "food" => Ok(Self::Food),
            "travel" => Ok(Self::Travel),
            _ => Err(ParseStageError(s.to_string())),
        }
    }
}

/// Everything a transport needs to open one stage's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    /// The trip the recommendation belongs to.
    pub trip_id: String,
    /// Which recommendation to fetch.
    pub stage: Stage,
    /// Whether the body carries `<reasoning>`/`<response>` tags.
    pub tagged: bool,
}

impl StageRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(trip_id: impl Into<String>, stage: Stage, tagged: bool) -> Self {
        Self { trip_id: trip_id.into(), stage, tagged }
    }
}

/// Network capability used by the orchestrator: issue a request, get a byte stream back.
///
/// Implementations must be `Send + Sync` so one transport can serve many
/// independent orchestrations on the same runtime.
#[async_trait]
pub trait RecommendationTransport: Send + Sync {
    /// Opens the recommendation stream for one stage.
    ///
    /// # Errors
    /// Returns a `TransportError` if the request cannot be sent or the
    /// response status is not a success.
    async fn open_stream(&self, request: &StageRequest) -> Result<ByteStream, TransportError>;
}
