//! Streaming recommendation orchestrator for Wayfare.
//!
//! Runs the lodging, food and travel recommendation streams for a trip one
//! at a time. Each body is decoded incrementally, optionally split into
//! reasoning and visible text, and published as cumulative snapshots so an
//! observer can render progress live.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wayfare_abstraction::mock::MockTransport;
//! use wayfare_abstraction::Stage;
//! use wayfare_orchestrator::{OrchestratorConfig, Sequencer};
//!
//! # async fn demo() {
//! let transport = Arc::new(MockTransport::new().with_fragments(Stage::Food, &["Eat ", "here"]));
//! let sequencer = Sequencer::new(transport, "trip-1", &OrchestratorConfig::default()).unwrap();
//! let (handle, mut events) = sequencer.start();
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! let state = handle.await.unwrap();
//! assert!(state.all_complete);
//! # }
//! ```

pub mod chunk_source;
pub mod config;
pub mod error;
pub mod events;
pub mod parser;
pub mod runner;
pub mod sequencer;
pub mod stage;
pub mod state;

pub use chunk_source::ChunkSource;
pub use config::{ConfigError, OrchestratorConfig};
pub use error::StageError;
pub use events::{EventPublisher, ObserverGone, OrchestrationEvent};
pub use parser::{ParsedView, TagStreamParser};
pub use runner::StageRunner;
pub use sequencer::{RequestFactory, Sequencer, TripRequestFactory};
pub use stage::{StageOutcome, StageStatus};
pub use state::{OrchestrationState, SequencerPhase, StageEntry};
