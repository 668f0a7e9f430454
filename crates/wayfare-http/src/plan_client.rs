use tracing::{debug, error};
use wayfare_abstraction::{TransportError, TripPlan, TripSummary};

use crate::{ApiEndpoint, check_status};

/// Stores and fetches trip plans.
#[derive(Debug, Clone)]
pub struct PlanClient {
    endpoint: ApiEndpoint,
}

impl PlanClient {
    /// Creates a client for `endpoint`.
    #[must_use]
    pub const fn new(endpoint: ApiEndpoint) -> Self {
        Self { endpoint }
    }

    /// Stores a plan with `POST {base}/plan`.
    ///
    /// Any 2xx answer is success; its body is ignored.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the request fails or the status is not 2xx.
    pub async fn create_plan(&self, plan: &TripPlan) -> Result<(), TransportError> {
        let url = self.endpoint.url(&["plan"])?;
        debug!(url = %url, trip_id = %plan.id, "Creating plan");

        let response = self.endpoint.client().post(url.clone()).json(plan).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send plan");
            TransportError::Request(e.to_string())
        })?;
        check_status(response).await?;
        Ok(())
    }

    /// Fetches a plan summary with `GET {base}/plan/{id}`.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the request fails, the status is not
    /// 2xx, or the body is not a valid summary.
    pub async fn get_plan(&self, id: &str) -> Result<TripSummary, TransportError> {
        let url = self.endpoint.url(&["plan", id])?;
        debug!(url = %url, "Fetching plan");

        let response = self.endpoint.client().get(url.clone()).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to fetch plan");
            TransportError::Request(e.to_string())
        })?;
        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| TransportError::Stream(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, url = %url, "Malformed plan summary");
            TransportError::Serialization(e.to_string())
        })
    }
}
