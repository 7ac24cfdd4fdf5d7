//! Live status channel client
//!
//! This module contains:
//! - `packet` - Engine.IO / Socket.IO text packet codec
//! - `transport` - Transport trait and the WebSocket implementation
//! - `session` - Session controller with start/stop lifecycle and reconnects

pub mod packet;
pub mod session;
pub mod transport;

pub use packet::{EnginePacket, OpenInfo, PacketError, SocketPacket};
pub use session::TimelineSession;
pub use transport::{socket_url, InboundEvent, Transport, TransportError, WebSocketTransport};
