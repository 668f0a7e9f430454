//! Trip creation and retrieval bodies.

use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of `POST /plan`.
///
/// Dates travel as `YYYY-MM-DD`. The budget is a positive whole number of
/// dollars; zero is rejected when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripPlan {
    /// Caller-chosen trip identifier.
    pub id: String,
    /// Destination key (e.g. "paris").
    pub destination: String,
    /// First day of the trip.
    pub from_date: NaiveDate,
    /// Last day of the trip.
    pub to_date: NaiveDate,
    /// Total budget in USD.
    pub budget: NonZeroU32,
}

impl TripPlan {
    /// Creates a new trip plan.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        destination: impl Into<String>,
        from_date: NaiveDate,
        to_date: NaiveDate,
        budget: NonZeroU32,
    ) -> Self {
        Self { id: id.into(), destination: destination.into(), from_date, to_date, budget }
    }

    /// The retrieval view of this plan.
    #[must_use]
    pub fn summary(&self) -> TripSummary {
        TripSummary {
            destination: self.destination.clone(),
            from_date: self.from_date,
            to_date: self.to_date,
            budget: self.budget,
        }
    }
}

/// Body of `GET /plan/{id}`.
///
/// `destination` is the canonical field. Older records stored it as
/// `location`, which is still accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
    /// Destination key.
    #[serde(alias = "location")]
    pub destination: String,
    /// First day of the trip.
    pub from_date: NaiveDate,
    /// Last day of the trip.
    pub to_date: NaiveDate,
    /// Total budget in USD.
    pub budget: NonZeroU32,
}
