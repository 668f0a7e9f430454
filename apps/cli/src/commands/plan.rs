//! Plan command implementation.
//!
//! Streams the recommendations for a trip, one stage at a time, and renders
//! them as they arrive.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, bail};
use colored::Colorize;
use tracing::{debug, info};
use wayfare_http::{HttpTransport, PlanClient};
use wayfare_orchestrator::{OrchestratorConfig, Sequencer, SequencerPhase};

use super::event_renderer::{EventRenderer, render_json};
use super::show::print_summary;

/// Execute the plan command.
pub async fn execute(
    client: &PlanClient,
    transport: HttpTransport,
    config: OrchestratorConfig,
    id: &str,
    json_output: bool,
) -> anyhow::Result<()> {
    let sequencer =
        Sequencer::new(Arc::new(transport), id, &config).context("Invalid orchestrator configuration")?;

    let summary = client.get_plan(id).await.with_context(|| format!("Failed to fetch plan {id}"))?;
    if !json_output {
        print_summary(id, &summary);
    }

    let cancel = sequencer.cancellation_token();
    let (handle, mut events) = sequencer.start();

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let stdout = std::io::stdout();
    let styled = stdout.is_terminal();
    let mut renderer = EventRenderer::new(stdout, styled);
    while let Some(event) = events.recv().await {
        debug!(stage = ?event.stage(), event = ?event, "Rendering event");
        if json_output {
            render_json(renderer.writer(), &event)?;
        } else {
            renderer.render(&event)?;
        }
    }
    drop(renderer);
    interrupt.abort();

    let state = handle.await.context("Orchestration task failed")?;
    if state.phase == SequencerPhase::Abandoned {
        eprintln!("{}", "Planning cancelled".yellow());
        bail!("planning for trip {id} was cancelled");
    }
    Ok(())
}
