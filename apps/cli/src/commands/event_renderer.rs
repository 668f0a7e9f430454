//! Terminal rendering of orchestration events.
//!
//! Updates carry the whole visible text of a stage. When the new text
//! extends what is already on screen only the new suffix is printed; when
//! the parser rewrote it (a tag closed and its markers vanished) the stage
//! text is printed again on a fresh line.

use std::collections::HashMap;
use std::io::Write;

use colored::Colorize;
use wayfare_abstraction::Stage;
use wayfare_orchestrator::OrchestrationEvent;

/// Writes events as human-readable progress.
pub struct EventRenderer<W: Write> {
    out: W,
    styled: bool,
    shown: HashMap<Stage, String>,
    reasoning: HashMap<Stage, String>,
}

impl<W: Write> EventRenderer<W> {
    /// Creates a renderer writing to `out`; `styled` enables colors.
    pub fn new(out: W, styled: bool) -> Self {
        Self { out, styled, shown: HashMap::new(), reasoning: HashMap::new() }
    }

    /// Renders one event.
    pub fn render(&mut self, event: &OrchestrationEvent) -> std::io::Result<()> {
        match event {
            OrchestrationEvent::StageStarted { stage } => {
                let header = format!("== {} ==", stage.title());
                let header = if self.styled { header.cyan().bold().to_string() } else { header };
                writeln!(self.out, "\n{header}")?;
            }
            OrchestrationEvent::StageUpdate { stage, visible, reasoning } => {
                let shown = self.shown.entry(*stage).or_default();
                if let Some(delta) = visible.strip_prefix(shown.as_str()) {
                    write!(self.out, "{delta}")?;
                } else {
                    let marker = if self.styled { "↺".yellow().to_string() } else { "↺".to_string() };
                    write!(self.out, "\n{marker} {visible}")?;
                }
                shown.clone_from(visible);
                if let Some(reasoning) = reasoning {
                    self.reasoning.insert(*stage, reasoning.clone());
                }
            }
            OrchestrationEvent::ReasoningComplete { stage } => {
                if let Some(reasoning) = self.reasoning.get(stage).filter(|r| !r.trim().is_empty()) {
                    let text = format!("Reasoning: {}", reasoning.trim());
                    let text = if self.styled { text.dimmed().to_string() } else { text };
                    write!(self.out, "\n\n{text}")?;
                }
            }
            OrchestrationEvent::StageCompleted { .. } => {
                writeln!(self.out)?;
            }
            OrchestrationEvent::StageFailed { message, .. } => {
                let text = format!("Error: {message}");
                let text = if self.styled { text.red().to_string() } else { text };
                writeln!(self.out, "\n{text}")?;
            }
            OrchestrationEvent::AllComplete => {
                let text = "✓ All recommendations complete";
                let text = if self.styled { text.green().bold().to_string() } else { text.to_string() };
                writeln!(self.out, "\n{text}")?;
            }
        }
        self.out.flush()
    }

    /// The underlying writer.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }
}

/// Writes one JSON object per event.
pub fn render_json<W: Write>(out: &mut W, event: &OrchestrationEvent) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    out.flush()
}
