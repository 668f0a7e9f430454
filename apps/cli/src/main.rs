//! Wayfare CLI - Command-line client for Wayfare trip planning
//!
//! This CLI provides a `wayfare` command for storing trips and streaming
//! lodging, food and travel recommendations for them.

mod commands;
mod config;

use std::num::NonZeroU32;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;
use wayfare_http::{ApiEndpoint, HttpTransport, PlanClient};

use commands::{create, plan, show};
use config::WayfareConfig;

/// Wayfare CLI - Streaming trip recommendations
#[derive(Parser, Debug)]
#[command(
    name = "wayfare",
    author,
    version,
    about = "Wayfare - Streaming trip recommendations",
    long_about = "Wayfare stores trip plans and streams lodging, food and travel recommendations for them.\nRecommendations are requested one stage at a time and rendered as they arrive."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Backend base URL (overrides config and WAYFARE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a trip plan
    ///
    /// Stores the destination, dates and budget on the backend and prints the
    /// trip id to use with `show` and `plan`.
    Create {
        /// Destination (e.g. paris)
        #[arg(long)]
        destination: String,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(long = "from")]
        from_date: NaiveDate,

        /// Last day of the trip (YYYY-MM-DD)
        #[arg(long = "to")]
        to_date: NaiveDate,

        /// Total budget in USD
        #[arg(long)]
        budget: NonZeroU32,

        /// Trip id (a UUID is generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a stored trip plan
    Show {
        /// Trip id
        id: String,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream recommendations for a trip
    ///
    /// Runs the lodging, food and travel stages one after another and renders
    /// each as it streams in. A failed stage is reported and the next one
    /// still runs. Ctrl-C cancels.
    Plan {
        /// Trip id
        id: String,

        /// Output one JSON event per line
        #[arg(long)]
        json: bool,

        /// Fail a stage that takes longer than this many seconds
        #[arg(long)]
        stage_timeout: Option<u64>,
    },
}

fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut cli_config = WayfareConfig::discover_and_load()?;
    if let Some(api_url) = args.api_url {
        cli_config.api_url = Some(api_url);
    }

    // Initialize tracing
    let level = parse_level(args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let endpoint = ApiEndpoint::new(cli_config.api_url(), cli_config.connect_timeout())?;
    debug!(api_url = %endpoint.base_url(), "Configuration loaded");
    let client = PlanClient::new(endpoint.clone());

    match args.command {
        Command::Create { destination, from_date, to_date, budget, id, json } => {
            let args = create::CreateArgs { destination, from_date, to_date, budget, id, json };
            create::execute(&client, args).await?;
        }
        Command::Show { id, json } => {
            show::execute(&client, &id, json).await?;
        }
        Command::Plan { id, json, stage_timeout } => {
            let mut orchestrator = cli_config.orchestrator();
            if stage_timeout.is_some() {
                orchestrator.stage_timeout_secs = stage_timeout;
            }
            plan::execute(&client, HttpTransport::new(endpoint), orchestrator, &id, json).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("bogus"), Level::WARN);
    }

    #[test]
    fn test_plan_flags() {
        let args = Args::try_parse_from(["wayfare", "plan", "trip-1", "--json", "--stage-timeout", "30"]).unwrap();
        match args.command {
            Command::Plan { id, json, stage_timeout } => {
                assert_eq!(id, "trip-1");
                assert!(json);
                assert_eq!(stage_timeout, Some(30));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
