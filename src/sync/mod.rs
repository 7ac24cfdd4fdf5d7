//! Timeline synchronization module
//!
//! This module contains:
//! - `synchronizer` - Applies snapshots and live events to the rendered timeline
//! - `event` - Inbound status updates and outbound room requests
//! - `snapshot` - Initial state snapshot and where to load it from
//! - `view` - Rendering seam, presentation styles, and banners
//! - `error` - Synchronizer error types

pub mod error;
pub mod event;
pub mod snapshot;
pub mod synchronizer;
pub mod view;

pub use error::SyncError;
pub use event::{OutboundEvent, StatusUpdate, STATUS_UPDATE_EVENT};
pub use snapshot::{InitialState, SnapshotEntry, SnapshotError, SnapshotSource};
pub use synchronizer::{
    RenderedStep, Timeline, TimelineSynchronizer, WORKFLOW_FAILED_MESSAGE,
    WORKFLOW_SUCCEEDED_MESSAGE,
};
pub use view::{Banner, BannerKind, NoopView, Presentation, TerminalView, TimelineView, Tone};
