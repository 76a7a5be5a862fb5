//! Wire frames of the channel protocol.
//!
//! Every frame is a JSON object `{topic, event, payload, ref}`.

use resolvinator_core::error::ProtocolError;
use resolvinator_core::types::ChannelTopic;
use serde::Serialize;
use serde_json::{Map, Value};

/// Join request event.
pub const PHX_JOIN: &str = "phx_join";
/// Leave request event.
pub const PHX_LEAVE: &str = "phx_leave";
/// Server acknowledgement event.
pub const PHX_REPLY: &str = "phx_reply";
/// Server-side channel error event.
pub const PHX_ERROR: &str = "phx_error";

/// A frame that passed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Topic the frame belongs to.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event-specific payload.
    pub payload: Value,
    /// Correlation reference, if the server sent one.
    pub reference: Option<String>,
}

impl InboundFrame {
    /// Extracts the required fields from a decoded frame.
    ///
    /// `topic` and `event` must be strings and `payload` must be present.
    /// `ref` is optional; servers send `null` for broadcasts.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut map) = value else {
            return Err(ProtocolError::invalid_field("frame", "expected a JSON object"));
        };

        let topic = take_string(&mut map, "topic")?;
        let event = take_string(&mut map, "event")?;
        let payload = map
            .remove("payload")
            .ok_or_else(|| ProtocolError::missing_field("payload"))?;
        let reference = match map.remove("ref") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            topic,
            event,
            payload,
            reference,
        })
    }
}

fn take_string(map: &mut Map<String, Value>, field: &str) -> Result<String, ProtocolError> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ProtocolError::invalid_field(field, "expected a string")),
        None => Err(ProtocolError::missing_field(field)),
    }
}

/// A frame to be written to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundFrame {
    /// Target topic.
    pub topic: String,
    /// Event name.
    pub event: String,
    /// Event-specific payload.
    pub payload: Value,
    /// Fresh correlation reference.
    #[serde(rename = "ref")]
    pub reference: String,
}

impl OutboundFrame {
    /// Creates a frame.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        event: impl Into<String>,
        payload: Value,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            event: event.into(),
            payload,
            reference: reference.into(),
        }
    }

    /// Join request for `topic`.
    #[must_use]
    pub fn join(topic: &ChannelTopic, params: Value, reference: impl Into<String>) -> Self {
        Self::new(topic.as_str(), PHX_JOIN, params, reference)
    }

    /// Leave request for `topic`.
    #[must_use]
    pub fn leave(topic: &ChannelTopic, reference: impl Into<String>) -> Self {
        Self::new(topic.as_str(), PHX_LEAVE, Value::Object(Map::new()), reference)
    }

    /// Encodes the frame as JSON text.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing string keys and a `Value` cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
