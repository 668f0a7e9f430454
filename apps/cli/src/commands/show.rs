//! Show command implementation.

use anyhow::Context;
use colored::Colorize;
use wayfare_abstraction::TripSummary;
use wayfare_http::PlanClient;

/// Execute the show command.
pub async fn execute(client: &PlanClient, id: &str, json_output: bool) -> anyhow::Result<()> {
    let summary = client.get_plan(id).await.with_context(|| format!("Failed to fetch plan {id}"))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(id, &summary);
    }
    Ok(())
}

/// Prints the trip header shared by `show` and `plan`.
pub fn print_summary(id: &str, summary: &TripSummary) {
    println!("{}", format!("Trip {id}").bold().cyan());
    println!("  Destination: {}", summary.destination);
    println!("  Dates:       {} → {}", summary.from_date, summary.to_date);
    println!("  Budget:      ${}", summary.budget);
}
