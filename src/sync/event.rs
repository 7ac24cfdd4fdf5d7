//! Inbound and outbound live-channel events

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::timeline::{Message, StepStatus};

/// Event name carrying step status changes
pub const STATUS_UPDATE_EVENT: &str = "status_update";
pub const JOIN_EVENT: &str = "join";
pub const LEAVE_EVENT: &str = "leave";

#[derive(Debug, Deserialize)]
struct RawStatusUpdate {
    step_id: String,
    status: StepStatus,
    #[serde(default)]
    message: Value,
}

/// A `status_update` payload: `{step_id, status, message}`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub step_id: String,
    pub status: StepStatus,
    pub message: Option<Message>,
}

impl StatusUpdate {
    pub fn new(step_id: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step_id: step_id.into(),
            status,
            message: None,
        }
    }

    pub fn with_message(mut self, raw: &str) -> Self {
        self.message = Message::from_value(Value::String(raw.to_string()));
        self
    }

    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawStatusUpdate = serde_json::from_value(value)?;
        Ok(Self {
            step_id: raw.step_id,
            status: raw.status,
            message: Message::from_value(raw.message),
        })
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        Self::from_json(serde_json::from_str(s)?)
    }
}

/// Room membership requests sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutboundEvent {
    Join { room: String },
    Leave { room: String },
}

impl OutboundEvent {
    pub fn join(task_id: &str) -> Self {
        OutboundEvent::Join {
            room: task_id.to_string(),
        }
    }

    pub fn leave(task_id: &str) -> Self {
        OutboundEvent::Leave {
            room: task_id.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Join { .. } => JOIN_EVENT,
            OutboundEvent::Leave { .. } => LEAVE_EVENT,
        }
    }

    pub fn room(&self) -> &str {
        match self {
            OutboundEvent::Join { room } | OutboundEvent::Leave { room } => room,
        }
    }

    pub fn payload(&self) -> Value {
        json!({ "room": self.room() })
    }
}
