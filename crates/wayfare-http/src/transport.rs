use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, error};
use wayfare_abstraction::{ByteStream, RecommendationTransport, StageRequest, TransportError};

use crate::{ApiEndpoint, check_status};

/// Opens recommendation streams over HTTP.
///
/// `GET {base}/plan/{trip_id}/recommendation/{stage}`; the response body is
/// handed to the orchestrator chunk by chunk as it arrives.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: ApiEndpoint,
}

impl HttpTransport {
    /// Creates a transport for `endpoint`.
    #[must_use]
    pub const fn new(endpoint: ApiEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl RecommendationTransport for HttpTransport {
    async fn open_stream(&self, request: &StageRequest) -> Result<ByteStream, TransportError> {
        let url = self.endpoint.url(&["plan", &request.trip_id, "recommendation", request.stage.as_str()])?;
        debug!(url = %url, stage = %request.stage, "Opening recommendation stream");

        let response = self.endpoint.client().get(url.clone()).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send recommendation request");
            TransportError::Request(e.to_string())
        })?;
        let response = check_status(response).await?;

        Ok(Box::pin(response.bytes_stream().map_err(|e| TransportError::Stream(e.to_string()))))
    }
}
