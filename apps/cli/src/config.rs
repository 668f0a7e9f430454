//! CLI configuration file support.
//!
//! Configuration precedence, lowest first:
//! 1. Defaults
//! 2. Global config file (`~/.wayfare/config.toml`)
//! 3. Local config file (`./.wayfarerc`)
//! 4. `WAYFARE_API_URL`
//! 5. Command-line flags (applied by `main`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wayfare_orchestrator::OrchestratorConfig;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Environment variable overriding the configured backend.
pub const API_URL_ENV: &str = "WAYFARE_API_URL";

/// CLI configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayfareConfig {
    /// Backend base URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// Connect timeout for backend requests, in seconds
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Stage sequencing settings
    #[serde(default)]
    pub orchestrator: Option<OrchestratorConfig>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl WayfareConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Global configuration file path.
    pub fn default_global_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".wayfare").join("config.toml"))
    }

    /// Local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".wayfarerc")
    }

    /// Discover and load configuration files, then apply the environment.
    ///
    /// Missing files are skipped; a file that exists but cannot be read or
    /// parsed is an error.
    pub fn discover_and_load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let paths = Self::default_global_path().into_iter().chain([Self::default_local_path()]);
        for path in paths {
            if path.is_file() {
                config.merge(Self::load_from_file(&path)?);
            }
        }

        if let Ok(api_url) = std::env::var(API_URL_ENV) {
            if !api_url.trim().is_empty() {
                config.api_url = Some(api_url);
            }
        }
        Ok(config)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set. An
    /// `[orchestrator]` table replaces the previous one as a whole.
    pub fn merge(&mut self, other: Self) {
        if other.api_url.is_some() {
            self.api_url = other.api_url;
        }
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.orchestrator.is_some() {
            self.orchestrator = other.orchestrator;
        }
    }

    /// Backend base URL, falling back to [`DEFAULT_API_URL`].
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Connect timeout for backend requests.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout_secs.map_or(wayfare_http::DEFAULT_CONNECT_TIMEOUT, Duration::from_secs)
    }

    /// Stage sequencing settings, defaulted when absent.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        self.orchestrator.clone().unwrap_or_default()
    }
}
