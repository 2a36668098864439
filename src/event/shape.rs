use super::{EmojiRecord, EventKind, EMOJI_ADDED, EMOJI_DELETED, EMOJI_UPDATED};
use crate::envelope::Envelope;
use serde_json::{Map, Value};
use std::fmt;

/// A well-formed envelope whose body does not have the expected shape
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidShapeError {
    pub event_type: String,
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for InvalidShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} body: field '{}' must be {}, found {}",
            self.event_type, self.field, self.expected, self.found
        )
    }
}

impl std::error::Error for InvalidShapeError {}

/// Body shapes per type tag:
/// - emojiAdded: `emoji` is an object
/// - emojiUpdated / emojiDeleted: `emojis` is an array of objects
/// - anything else: no requirement
pub(super) fn extract(envelope: &Envelope) -> Result<EventKind, InvalidShapeError> {
    match envelope.event_type.as_str() {
        EMOJI_ADDED => {
            let emoji = object_field(envelope, "emoji")?;
            Ok(EventKind::Added(EmojiRecord::from_object(emoji)))
        }
        EMOJI_UPDATED => Ok(EventKind::Updated(object_array_field(envelope, "emojis")?)),
        EMOJI_DELETED => Ok(EventKind::Deleted(object_array_field(envelope, "emojis")?)),
        other => Ok(EventKind::Unrecognized(other.to_string())),
    }
}

fn object_field<'a>(
    envelope: &'a Envelope,
    field: &str,
) -> Result<&'a Map<String, Value>, InvalidShapeError> {
    let value = envelope.body.get(field);
    value
        .and_then(Value::as_object)
        .ok_or_else(|| mismatch(envelope, field.to_string(), "an object", value))
}

fn object_array_field(
    envelope: &Envelope,
    field: &str,
) -> Result<Vec<EmojiRecord>, InvalidShapeError> {
    let value = envelope.body.get(field);
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| mismatch(envelope, field.to_string(), "an array", value))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object().map(EmojiRecord::from_object).ok_or_else(|| {
                mismatch(envelope, format!("{}[{}]", field, index), "an object", Some(item))
            })
        })
        .collect()
}

fn mismatch(
    envelope: &Envelope,
    field: String,
    expected: &'static str,
    found: Option<&Value>,
) -> InvalidShapeError {
    InvalidShapeError {
        event_type: envelope.event_type.clone(),
        field,
        expected,
        found: json_kind(found),
    }
}

fn json_kind(value: Option<&Value>) -> &'static str {
    match value {
        None => "nothing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "a boolean",
        Some(Value::Number(_)) => "a number",
        Some(Value::String(_)) => "a string",
        Some(Value::Array(_)) => "an array",
        Some(Value::Object(_)) => "an object",
    }
}
