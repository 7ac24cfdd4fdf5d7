//! # Timeline Sync
//!
//! A live, reconnect-safe status timeline for long-running multi-step
//! workflows run by an external backend.
//!
//! ## Features
//!
//! - **Snapshot + live reconciliation** - Page-load state and a live event
//!   stream applied with last-write-wins semantics
//! - **Derived completion** - Overall success/fail inferred from step events
//! - **Reconnect-safe** - Rejoins the task room on every reconnect without
//!   losing rendered state
//! - **Socket.IO over WebSocket** - Talks to the backend's real-time event bus
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use timeline_sync::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TimelineConfig::load("timeline.yaml")?;
//!     let sync = TimelineSynchronizer::new("7d2f0c7e", config.timeline.clone(), TerminalView::new(true))?;
//!
//!     let transport = WebSocketTransport::new(&config.server, &config.socket_path);
//!     let session = TimelineSession::start(sync, transport, config.reconnect.clone());
//!
//!     let overall = session.wait_for_finish().await;
//!     println!("Workflow finished: {}", overall);
//!
//!     session.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod sync;
pub mod timeline;

// Re-export main types
pub use client::{
    EnginePacket, InboundEvent, PacketError, SocketPacket, TimelineSession, Transport,
    TransportError, WebSocketTransport,
};
pub use sync::{
    Banner, BannerKind, InitialState, NoopView, OutboundEvent, Presentation, RenderedStep,
    SnapshotError, SnapshotSource, StatusUpdate, SyncError, TerminalView, Timeline,
    TimelineSynchronizer, TimelineView,
};
pub use timeline::{
    ConnectionState, DefinitionError, LoadError, Message, OverallState, ReconnectConfig,
    StepDefinition, StepStatus, TimelineConfig, TimelineDefinition,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{InboundEvent, TimelineSession, Transport, WebSocketTransport};
    pub use crate::sync::{
        InitialState, OutboundEvent, SnapshotSource, StatusUpdate, SyncError, TerminalView,
        Timeline, TimelineSynchronizer, TimelineView,
    };
    pub use crate::timeline::{
        ConnectionState, Message, OverallState, ReconnectConfig, StepDefinition, StepStatus,
        TimelineConfig, TimelineDefinition,
    };
}
