//! Live channel transports
//!
//! A `Transport` is one reconnectable connection to the status event bus.
//! Reconnect policy lives in the session, not here: a transport only knows
//! how to open a connection, speak on it, and notice that it is gone.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::packet::{EnginePacket, SocketPacket};
use crate::sync::event::{OutboundEvent, StatusUpdate, STATUS_UPDATE_EVENT};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Connection refused by server: {0}")]
    Refused(String),

    #[error("Connection closed")]
    Closed,

    #[error("No data from server within {0:?}")]
    Timeout(Duration),

    #[error("Not connected")]
    NotConnected,
}

/// Events the synchronizer consumes from the live channel
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    StatusUpdate(StatusUpdate),
}

#[async_trait]
pub trait Transport: Send {
    /// Open a connection and finish any protocol handshake
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Send a room request on the open connection
    async fn emit(&mut self, event: &OutboundEvent) -> Result<(), TransportError>;

    /// Wait for the next inbound event. Any error means the connection is lost.
    async fn next_event(&mut self) -> Result<InboundEvent, TransportError>;

    /// Close the connection if open
    async fn close(&mut self);
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket.IO client over a WebSocket, Engine.IO protocol v4
pub struct WebSocketTransport {
    url: String,
    stream: Option<WsStream>,
    idle_timeout: Duration,
}

/// Build the Engine.IO WebSocket URL from a server base URL and socket path
pub fn socket_url(server: &str, socket_path: &str) -> String {
    let server = server.trim_end_matches('/');
    let base = if let Some(rest) = server.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = server.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else {
        server.to_string()
    };
    let path = socket_path.trim_matches('/');
    format!("{}/{}/?EIO=4&transport=websocket", base, path)
}

impl WebSocketTransport {
    pub fn new(server: &str, socket_path: &str) -> Self {
        Self {
            url: socket_url(server, socket_path),
            stream: None,
            idle_timeout: HANDSHAKE_TIMEOUT,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        stream.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Read the next decodable Engine.IO packet. Frames that fail to decode
    /// are logged and skipped.
    async fn read_packet(&mut self, timeout: Duration) -> Result<EnginePacket, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            let frame = tokio::time::timeout(timeout, stream.next())
                .await
                .map_err(|_| TransportError::Timeout(timeout))?;

            match frame {
                Some(Ok(Message::Text(text))) => match EnginePacket::decode(&text) {
                    Ok(packet) => return Ok(packet),
                    Err(e) => warn!(error = %e, frame = %text, "Dropping undecodable frame"),
                },
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), TransportError> {
        let open = loop {
            match self.read_packet(HANDSHAKE_TIMEOUT).await? {
                EnginePacket::Open(info) => break info,
                EnginePacket::Noop => continue,
                other => {
                    return Err(TransportError::Handshake(format!(
                        "expected open packet, got {:?}",
                        other
                    )))
                }
            }
        };
        self.idle_timeout = Duration::from_millis(open.idle_timeout_ms());
        debug!(sid = %open.sid, idle_timeout = ?self.idle_timeout, "Engine.IO session opened");

        self.send_text(SocketPacket::connect().to_frame()).await?;

        loop {
            match self.read_packet(self.idle_timeout).await? {
                EnginePacket::Message(SocketPacket::Connect { .. }) => return Ok(()),
                EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
                    let reason = data.map(|d| d.to_string()).unwrap_or_default();
                    return Err(TransportError::Refused(reason));
                }
                EnginePacket::Ping(data) => self.send_text(EnginePacket::Pong(data).encode()).await?,
                EnginePacket::Close => return Err(TransportError::Closed),
                other => debug!(packet = ?other, "Ignoring packet during handshake"),
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.close().await;

        debug!(url = %self.url, "Connecting to live status channel");
        let (stream, _) = connect_async(&self.url).await?;
        self.stream = Some(stream);

        if let Err(e) = self.handshake().await {
            self.stream = None;
            return Err(e);
        }

        info!(url = %self.url, "Live status channel open");
        Ok(())
    }

    async fn emit(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        let frame = SocketPacket::event(event.name(), event.payload()).to_frame();
        self.send_text(frame).await
    }

    async fn next_event(&mut self) -> Result<InboundEvent, TransportError> {
        loop {
            match self.read_packet(self.idle_timeout).await? {
                EnginePacket::Ping(data) => self.send_text(EnginePacket::Pong(data).encode()).await?,
                EnginePacket::Close | EnginePacket::Message(SocketPacket::Disconnect { .. }) => {
                    self.stream = None;
                    return Err(TransportError::Closed);
                }
                EnginePacket::Message(SocketPacket::Event { name, args, .. })
                    if name == STATUS_UPDATE_EVENT =>
                {
                    let payload = args.into_iter().next().unwrap_or(Value::Null);
                    match StatusUpdate::from_json(payload) {
                        Ok(update) => return Ok(InboundEvent::StatusUpdate(update)),
                        Err(e) => warn!(error = %e, "Dropping malformed status update"),
                    }
                }
                EnginePacket::Message(SocketPacket::Event { name, .. }) => {
                    debug!(event = %name, "Ignoring event")
                }
                other => debug!(packet = ?other, "Ignoring packet"),
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream
                .send(Message::Text(SocketPacket::disconnect().to_frame()))
                .await;
            let _ = stream.close(None).await;
        }
    }
}
