//! HTTP access to the Wayfare backend.
//!
//! [`HttpTransport`] opens recommendation streams for the orchestrator and
//! [`PlanClient`] stores and fetches trip plans. Both share an [`ApiEndpoint`]
//! holding the normalized base URL and one `reqwest` client.

mod plan_client;
mod transport;

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::error;
use wayfare_abstraction::TransportError;

pub use plan_client::PlanClient;
pub use transport::HttpTransport;

/// Default connect timeout for backend requests.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base URL plus the HTTP client used to reach it.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    base: Url,
    client: Client,
}

impl ApiEndpoint {
    /// Creates an endpoint for `base_url`.
    ///
    /// A trailing `/` on the base is ignored. Only the connect phase is
    /// bounded; recommendation bodies may stream for as long as they need.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`TransportError::Request`] if the client
    /// cannot be built.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!("{base_url}: expected an http(s) URL")));
        }

        let client = Client::builder().connect_timeout(connect_timeout).build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            TransportError::Request(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self { base, client })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) const fn client(&self) -> &Client {
        &self.client
    }

    /// Appends percent-encoded path segments to the base.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turns a non-success response into [`TransportError::Status`].
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default().trim().to_string();
    error!(status = %status, url = %url, body = %body, "Backend returned error status");
    Err(TransportError::Status { status: status.as_u16(), body })
}
