//! Initial state snapshot
//!
//! The state of every step at the time the watcher starts, as a JSON
//! mapping `stepId -> {status, message}`. It can come from a file or from an
//! HTTP endpoint of the dashboard backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::sync::event::StatusUpdate;
use crate::timeline::{Message, StepStatus, TimelineDefinition};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub status: StepStatus,

    #[serde(default)]
    pub message: Value,
}

/// Entries are kept as raw JSON and decoded one at a time, so a single bad
/// entry is dropped without losing the rest of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialState {
    pub steps: HashMap<String, Value>,
}

impl InitialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step_id: impl Into<String>, status: StepStatus, message: Option<&str>) {
        let message = message.map(|m| Value::String(m.to_string())).unwrap_or(Value::Null);
        self.steps
            .insert(step_id.into(), serde_json::json!({ "status": status, "message": message }));
    }

    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Entries as status updates: definition order first, then ids the
    /// definition does not know, sorted
    pub fn ordered_updates(&self, definition: &TimelineDefinition) -> Vec<StatusUpdate> {
        let mut updates: Vec<StatusUpdate> = definition
            .steps
            .iter()
            .filter_map(|step| self.update_for(&step.id))
            .collect();

        let mut unknown: Vec<&String> = self
            .steps
            .keys()
            .filter(|id| !definition.contains(id))
            .collect();
        unknown.sort();
        updates.extend(unknown.into_iter().filter_map(|id| self.update_for(id)));

        updates
    }

    /// Decoded entry for `step_id`. Entries that do not decode (an unknown
    /// status, a missing status, not an object) are logged and skipped.
    pub fn entry(&self, step_id: &str) -> Option<SnapshotEntry> {
        let raw = self.steps.get(step_id)?;
        match SnapshotEntry::deserialize(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(step_id = %step_id, error = %e, "Dropping invalid snapshot entry");
                None
            }
        }
    }

    fn update_for(&self, step_id: &str) -> Option<StatusUpdate> {
        self.entry(step_id).map(|entry| StatusUpdate {
            step_id: step_id.to_string(),
            status: entry.status,
            message: Message::from_value(entry.message),
        })
    }
}

/// Where to load the initial state from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    File(PathBuf),
    Url(String),
}

impl SnapshotSource {
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            SnapshotSource::Url(source.to_string())
        } else {
            SnapshotSource::File(PathBuf::from(source))
        }
    }

    pub async fn load(&self) -> Result<InitialState, SnapshotError> {
        match self {
            SnapshotSource::File(path) => {
                debug!(path = %path.display(), "Reading snapshot file");
                let content = tokio::fs::read_to_string(path).await?;
                InitialState::from_json_str(&content)
            }
            SnapshotSource::Url(url) => {
                debug!(url = %url, "Fetching snapshot");
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()?;
                let response = client.get(url).send().await?;
                let status = response.status();

                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(SnapshotError::Http {
                        status: status.as_u16(),
                        message,
                    });
                }

                let state: InitialState = response.json().await?;
                info!(steps = state.len(), "Snapshot fetched");
                Ok(state)
            }
        }
    }
}
