//! Create command implementation.

use std::num::NonZeroU32;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use colored::Colorize;
use serde_json::json;
use wayfare_abstraction::TripPlan;
use wayfare_http::PlanClient;

use super::show::print_summary;

/// Arguments of `wayfare create`.
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub destination: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub budget: NonZeroU32,
    pub id: Option<String>,
    pub json: bool,
}

/// Execute the create command.
///
/// Stores the plan and prints its id, generating a UUID when none is given.
pub async fn execute(client: &PlanClient, args: CreateArgs) -> anyhow::Result<()> {
    if args.to_date < args.from_date {
        bail!("end date {} is before start date {}", args.to_date, args.from_date);
    }
    let destination = args.destination.trim();
    if destination.is_empty() {
        bail!("destination must not be empty");
    }

    let id = args.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let plan = TripPlan::new(id, destination, args.from_date, args.to_date, args.budget);
    client.create_plan(&plan).await.context("Failed to create plan")?;

    if args.json {
        println!("{}", json!({ "id": plan.id }));
    } else {
        println!("{} Created plan {}", "✓".green(), plan.id.bold());
        print_summary(&plan.id, &plan.summary());
        println!("  Run {} to get recommendations", format!("wayfare plan {}", plan.id).cyan());
    }
    Ok(())
}
