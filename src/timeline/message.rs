//! Step message payloads
//!
//! Backends send either free text or a JSON document embedded in a string,
//! usually prefixed with `Output: `. Decoding is explicit: a structured
//! decode is attempted and anything that is not a JSON object or array is
//! kept as opaque text.

use serde_json::Value;
use std::fmt;

const OUTPUT_PREFIX: &str = "Output: ";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Structured(Value),
    Plain(String),
}

impl Message {
    /// Decode a raw message string
    pub fn parse(raw: &str) -> Self {
        let candidate = raw.strip_prefix(OUTPUT_PREFIX).unwrap_or(raw).trim();

        match serde_json::from_str::<Value>(candidate) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Message::Structured(value),
            _ => Message::Plain(raw.to_string()),
        }
    }

    /// Decode a message field from an event payload. `null` and empty
    /// strings mean "no message".
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(Message::parse(&s)),
            value @ (Value::Object(_) | Value::Array(_)) => Some(Message::Structured(value)),
            other => Some(Message::Plain(other.to_string())),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Message::Structured(_))
    }

    /// Text shown under the step title
    pub fn render(&self) -> String {
        match self {
            Message::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Message::Plain(text) => text.clone(),
        }
    }
}

impl From<&str> for Message {
    fn from(raw: &str) -> Self {
        Message::parse(raw)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
