use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use timeline_sync::client::{InboundEvent, Transport, TransportError};
use timeline_sync::sync::{OutboundEvent, StatusUpdate};
use timeline_sync::timeline::{StepDefinition, StepStatus, TimelineDefinition, DEFAULT_FINISH_STEP};

pub const LAST_STEP: &str = "db9ca7f7-135d-4392-bf0a-36f1f688eb39";

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_file(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write test file");
}

/// Upload -> clean -> predict, followed by the finish indicator
pub fn stock_definition() -> TimelineDefinition {
    TimelineDefinition::new(vec![
        StepDefinition::new("0b9e5d6c-2f64-4c59-9a2b-5f1f3b0c9d21", "Upload stock data"),
        StepDefinition::new("5a0c3e2d-8f1b-4d8e-b6f4-2b9d7c1a0e55", "Clean data"),
        StepDefinition::new(LAST_STEP, "Predict stock"),
        StepDefinition::new(DEFAULT_FINISH_STEP, "Workflow finished"),
    ])
}

pub fn upload_step() -> &'static str {
    "0b9e5d6c-2f64-4c59-9a2b-5f1f3b0c9d21"
}

pub fn clean_step() -> &'static str {
    "5a0c3e2d-8f1b-4d8e-b6f4-2b9d7c1a0e55"
}

pub fn timeline_config(task_id: &str) -> String {
    format!(
        r#"
server: http://127.0.0.1:1
task_id: {}
reconnect:
  initial_delay: 10
  max_delay: 50
timeline:
  steps:
    - id: {}
      title: Upload stock data
    - id: {}
      title: Clean data
    - id: {}
      title: Predict stock
    - id: workflow_finish
      title: Workflow finished
"#,
        task_id,
        upload_step(),
        clean_step(),
        LAST_STEP
    )
}

pub fn update(step_id: &str, status: StepStatus) -> InboundEvent {
    InboundEvent::StatusUpdate(StatusUpdate::new(step_id, status))
}

/// One scripted connection: events delivered in order. `Err` ends the
/// connection; running out of events keeps it open until the session stops.
pub type Script = Vec<Result<InboundEvent, TransportError>>;

/// In-memory transport that replays scripted connections and records
/// everything the session emits
pub struct MockTransport {
    connections: VecDeque<VecDeque<Result<InboundEvent, TransportError>>>,
    current: Option<VecDeque<Result<InboundEvent, TransportError>>>,
    emitted: Arc<Mutex<Vec<OutboundEvent>>>,
    connects: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            connections: scripts.into_iter().map(VecDeque::from).collect(),
            current: None,
            emitted: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(Mutex::new(0)),
        }
    }

    pub fn emitted(&self) -> Arc<Mutex<Vec<OutboundEvent>>> {
        self.emitted.clone()
    }

    pub fn connects(&self) -> Arc<Mutex<usize>> {
        self.connects.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        match self.connections.pop_front() {
            Some(script) => {
                *self.connects.lock().unwrap() += 1;
                self.current = Some(script);
                Ok(())
            }
            None => Err(TransportError::Refused("no more scripted connections".to_string())),
        }
    }

    async fn emit(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        if self.current.is_none() {
            return Err(TransportError::NotConnected);
        }
        self.emitted.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn next_event(&mut self) -> Result<InboundEvent, TransportError> {
        let next = self.current.as_mut().and_then(|script| script.pop_front());
        match next {
            Some(Err(e)) => {
                self.current = None;
                Err(e)
            }
            Some(Ok(event)) => Ok(event),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.current = None;
    }
}
