//! Timeline configuration
//!
//! Configuration for watching a workflow timeline, loaded from timeline.yaml:
//!
//! ```yaml
//! server: http://localhost:5000
//! socket_path: /socket.io/
//! task_id: 7d2f0c7e-5d0b-4b5e-9a51-0b0e0d1c8e11
//! snapshot: http://localhost:5000/api/workflow/7d2f0c7e/state
//!
//! reconnect:
//!   initial_delay: 1000
//!   max_delay: 30000
//!
//! timeline:
//!   steps:
//!     - id: 0b9e5d6c-2f64-4c59-9a2b-5f1f3b0c9d21
//!       title: Upload stock data
//!     - id: db9ca7f7-135d-4392-bf0a-36f1f688eb39
//!       title: Predict stock
//!     - id: workflow_finish
//!       title: Workflow finished
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::definition::{DefinitionError, TimelineDefinition};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("Invalid timeline in {file}: {error}")]
    Invalid {
        file: String,
        error: DefinitionError,
    },
}

/// Reconnect backoff for the live channel, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay: u64,
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Workflow instance to watch; usually given on the command line
    #[serde(default)]
    pub task_id: Option<String>,

    /// File path or http(s) URL of the initial state snapshot
    #[serde(default)]
    pub snapshot: Option<String>,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    pub timeline: TimelineDefinition,
}

fn default_server() -> String {
    "http://localhost:5000".to_string()
}

fn default_socket_path() -> String {
    "/socket.io/".to_string()
}

impl TimelineConfig {
    pub fn new(timeline: TimelineDefinition) -> Self {
        Self {
            server: default_server(),
            socket_path: default_socket_path(),
            task_id: None,
            snapshot: None,
            reconnect: ReconnectConfig::default(),
            timeline,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: TimelineConfig =
            serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
                file: path.display().to_string(),
                error: e,
            })?;

        config.timeline.validate().map_err(|e| LoadError::Invalid {
            file: path.display().to_string(),
            error: e,
        })?;

        Ok(config)
    }
}
