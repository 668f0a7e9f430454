//! Error types for stage execution.

use std::time::Duration;

use thiserror::Error;
use wayfare_abstraction::TransportError;

/// Why a stage ended in the Failed state.
///
/// Failures are stage-scoped: they are published as text for that stage and
/// never abort the rest of the orchestration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The request could not be sent or the response was not a success.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The body stream aborted mid-read.
    #[error("stream read failed: {0}")]
    StreamRead(String),

    /// The stage did not finish within the configured time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
