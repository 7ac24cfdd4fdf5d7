//! Engine.IO v4 / Socket.IO v5 text packet codec
//!
//! Wire format of the live status channel. Every WebSocket text frame is one
//! Engine.IO packet: a single type digit followed by its data. Message
//! packets (`4`) carry a Socket.IO packet:
//!
//! ```text
//! <type>[<namespace>,][<ack id>][<json payload>]
//! ```
//!
//! so an inbound status update looks like
//! `42["status_update",{"step_id":"...","status":"running","message":null}]`.
//! Binary packets are not used by the status channel and are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown packet type: {0}")]
    UnknownType(char),

    #[error("Binary packets are not supported")]
    Binary,

    #[error("Invalid ack id: {0}")]
    InvalidAckId(String),

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),
}

impl From<serde_json::Error> for PacketError {
    fn from(e: serde_json::Error) -> Self {
        PacketError::InvalidJson(e.to_string())
    }
}

/// Handshake data sent by the server in the open packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,

    #[serde(default)]
    pub upgrades: Vec<String>,

    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25000
}

fn default_ping_timeout() -> u64 {
    20000
}

impl OpenInfo {
    /// Longest silence before the server counts as gone, in milliseconds
    pub fn idle_timeout_ms(&self) -> u64 {
        self.ping_interval + self.ping_timeout
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let data = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(data)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(data)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(info) => {
                format!("0{}", serde_json::to_string(info).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for the default namespace
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn disconnect() -> Self {
        SocketPacket::Disconnect {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn event(name: &str, payload: Value) -> Self {
        SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            name: name.to_string(),
            args: vec![payload],
        }
    }

    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        match kind {
            '0'..='4' => {}
            '5' | '6' => return Err(PacketError::Binary),
            other => return Err(PacketError::UnknownType(other)),
        }
        let mut rest = chars.as_str();

        let namespace: &str = if rest.starts_with('/') {
            match rest.find(',') {
                Some(i) => {
                    let ns = &rest[..i];
                    rest = &rest[i + 1..];
                    ns
                }
                None => {
                    let ns = rest;
                    rest = "";
                    ns
                }
            }
        } else {
            DEFAULT_NAMESPACE
        };
        let namespace = namespace.to_string();

        let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        let ack_id = if digits > 0 {
            let id = &rest[..digits];
            Some(
                id.parse::<u64>()
                    .map_err(|_| PacketError::InvalidAckId(id.to_string()))?,
            )
        } else {
            None
        };
        rest = &rest[digits..];

        let data: Option<Value> = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(args)) => args,
                    other => {
                        return Err(PacketError::InvalidEvent(format!(
                            "expected array, got {:?}",
                            other
                        )))
                    }
                };
                if args.is_empty() {
                    return Err(PacketError::InvalidEvent("missing event name".to_string()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(PacketError::InvalidEvent(format!(
                            "event name is not a string: {}",
                            other
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                })
            }
            '3' => {
                let ack_id = ack_id.ok_or_else(|| PacketError::InvalidAckId(String::new()))?;
                let args = match data {
                    Some(Value::Array(args)) => args,
                    Some(other) => vec![other],
                    None => Vec::new(),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    ack_id,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                format!("0{}{}", namespace_prefix(namespace), json_or_empty(data.as_ref()))
            }
            SocketPacket::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    namespace_prefix(namespace),
                    ack_id.map(|id| id.to_string()).unwrap_or_default(),
                    Value::Array(array)
                )
            }
            SocketPacket::Ack {
                namespace,
                ack_id,
                args,
            } => format!(
                "3{}{}{}",
                namespace_prefix(namespace),
                ack_id,
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, data } => {
                format!("4{}{}", namespace_prefix(namespace), json_or_empty(data.as_ref()))
            }
        }
    }

    /// Encode as the Engine.IO message frame that carries it
    pub fn to_frame(&self) -> String {
        format!("4{}", self.encode())
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{},", namespace)
    }
}

fn json_or_empty(value: Option<&Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":5000,"maxPayload":1000000}"#,
        )
        .unwrap();

        match packet {
            EnginePacket::Open(info) => {
                assert_eq!(info.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(info.idle_timeout_ms(), 30000);
            }
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ping_and_close() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
    }

    #[test]
    fn test_decode_status_update_event() {
        let packet = EnginePacket::decode(
            r#"42["status_update",{"step_id":"s1","status":"running","message":null}]"#,
        )
        .unwrap();

        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                namespace: "/".to_string(),
                ack_id: None,
                name: "status_update".to_string(),
                args: vec![json!({"step_id": "s1", "status": "running", "message": null})],
            })
        );
    }

    #[test]
    fn test_decode_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/admin,13["ping",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".to_string(),
                ack_id: Some(13),
                name: "ping".to_string(),
                args: vec![json!(1)],
            }
        );
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "abc"})),
            }
        );
    }

    #[test]
    fn test_encode_join() {
        let frame = SocketPacket::event("join", json!({"room": "task-1"})).to_frame();
        assert_eq!(frame, r#"42["join",{"room":"task-1"}]"#);
        assert_eq!(SocketPacket::connect().to_frame(), "40");
        assert_eq!(SocketPacket::disconnect().to_frame(), "41");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(EnginePacket::decode(""), Err(PacketError::Empty));
        assert_eq!(EnginePacket::decode("9"), Err(PacketError::UnknownType('9')));
        assert_eq!(SocketPacket::decode(r#"51-["x",{}]"#), Err(PacketError::Binary));
        assert!(matches!(
            SocketPacket::decode(r#"2{"not":"array"}"#),
            Err(PacketError::InvalidEvent(_))
        ));
        assert!(matches!(
            SocketPacket::decode(r#"2["x","#),
            Err(PacketError::InvalidJson(_))
        ));
    }
}
