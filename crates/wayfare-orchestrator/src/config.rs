//! Orchestrator configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wayfare_abstraction::Stage;

/// Settings for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Stages to run, in order.
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,
    /// Stages whose bodies carry `<reasoning>`/`<response>` tags.
    #[serde(default = "default_tagged_stages")]
    pub tagged_stages: Vec<Stage>,
    /// Upper bound on the time one stage waits on the transport.
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,
    /// Capacity of the event channel handed to observers.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_stages() -> Vec<Stage> {
    Stage::ALL.to_vec()
}

fn default_tagged_stages() -> Vec<Stage> {
    vec![Stage::Lodging]
}

const fn default_event_buffer() -> usize {
    64
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            tagged_stages: default_tagged_stages(),
            stage_timeout_secs: None,
            event_buffer: default_event_buffer(),
        }
    }
}

/// Invalid orchestrator settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No stages to run.
    #[error("at least one stage must be configured")]
    NoStages,

    /// A stage appears twice in the run order.
    #[error("stage '{0}' is listed more than once")]
    DuplicateStage(Stage),

    /// The event channel cannot have zero capacity.
    #[error("event_buffer must be greater than zero")]
    ZeroEventBuffer,

    /// A zero timeout would fail every stage immediately.
    #[error("stage_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl OrchestratorConfig {
    /// Per-stage timeout, if configured.
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }

    /// Whether `stage` is parsed for tags.
    pub fn is_tagged(&self, stage: Stage) -> bool {
        self.tagged_stages.contains(&stage)
    }

    /// Checks the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(*stage) {
                return Err(ConfigError::DuplicateStage(*stage));
            }
        }

        if self.event_buffer == 0 {
            return Err(ConfigError::ZeroEventBuffer);
        }
        if self.stage_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.stages, vec![Stage::Lodging, Stage::Food, Stage::Travel]);
        assert!(config.is_tagged(Stage::Lodging));
        assert!(!config.is_tagged(Stage::Food));
        assert_eq!(config.stage_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            tagged_stages = ["lodging", "travel"]
            stage_timeout_secs = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.stages, Stage::ALL.to_vec());
        assert!(config.is_tagged(Stage::Travel));
        assert_eq!(config.stage_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.event_buffer, 64);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let config = OrchestratorConfig { stages: vec![], ..OrchestratorConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::NoStages));

        let config = OrchestratorConfig {
            stages: vec![Stage::Food, Stage::Food],
            ..OrchestratorConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DuplicateStage(Stage::Food)));

        let config = OrchestratorConfig { event_buffer: 0, ..OrchestratorConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroEventBuffer));

        let config = OrchestratorConfig { stage_timeout_secs: Some(0), ..OrchestratorConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }
}
