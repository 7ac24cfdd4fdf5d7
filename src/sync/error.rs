//! Synchronizer error types

use crate::sync::snapshot::SnapshotError;

/// Errors surfaced by the timeline synchronizer and its session
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Task ID is missing; timeline updates cannot be loaded")]
    MissingTaskId,

    #[error("Initial state was already applied")]
    InitialStateAlreadyApplied,

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Session task failed: {0}")]
    SessionFailed(String),
}
