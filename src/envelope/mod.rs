use serde_json::{Map, Value};
use std::fmt;

mod protocol;
#[cfg(test)]
mod tests;

pub use protocol::{ControlFrame, SubscriptionId, MAIN_CHANNEL};

/// Envelope is a decoded inbound stream message.
///
/// The body is kept untyped here; turning it into a typed event is the
/// job of [`crate::event::EventKind::from_envelope`].
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Value of the `type` field (e.g. "emojiAdded")
    pub event_type: String,

    /// Value of the `body` field
    pub body: Map<String, Value>,
}

impl Envelope {
    /// Decodes raw frame bytes into an envelope.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        decode(raw)
    }
}

/// Decode errors for inbound frames
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Malformed(String),
    NotAnObject,
    MissingType,
    TypeNotString,
    MissingBody,
    BodyNotObject,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Malformed(reason) => write!(f, "frame is not valid JSON: {}", reason),
            DecodeError::NotAnObject => write!(f, "frame must be a JSON object"),
            DecodeError::MissingType => write!(f, "type field is missing"),
            DecodeError::TypeNotString => write!(f, "type field is not a string"),
            DecodeError::MissingBody => write!(f, "body field is missing"),
            DecodeError::BodyNotObject => write!(f, "body field is not an object"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes raw frame bytes into an [`Envelope`].
///
/// Rules:
/// - Bytes must be a well-formed JSON object
/// - `type` is required and must be a string
/// - `body` is required and must be an object
pub fn decode(raw: &[u8]) -> Result<Envelope, DecodeError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let Value::Object(mut message) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let event_type = match message.remove("type") {
        Some(Value::String(event_type)) => event_type,
        Some(_) => return Err(DecodeError::TypeNotString),
        None => return Err(DecodeError::MissingType),
    };

    let body = match message.remove("body") {
        Some(Value::Object(body)) => body,
        Some(_) => return Err(DecodeError::BodyNotObject),
        None => return Err(DecodeError::MissingBody),
    };

    Ok(Envelope { event_type, body })
}
