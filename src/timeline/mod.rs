//! Workflow timeline model
//!
//! This module contains:
//! - `status` - Step, overall, and connection status types
//! - `message` - Structured-or-plain step messages
//! - `definition` - Ordered step definitions for a workflow
//! - `config` - timeline.yaml configuration and loading

pub mod config;
pub mod definition;
pub mod message;
pub mod status;

pub use config::{LoadError, ReconnectConfig, TimelineConfig};
pub use definition::{DefinitionError, StepDefinition, TimelineDefinition, DEFAULT_FINISH_STEP};
pub use message::Message;
pub use status::{ConnectionState, OverallState, StepStatus, UnknownStatus};
