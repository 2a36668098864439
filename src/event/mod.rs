use serde_json::{Map, Value};

use crate::envelope::Envelope;

mod shape;

pub use shape::InvalidShapeError;

/// Rendered in place of any emoji field that is absent, null, or mistyped
pub const UNKNOWN: &str = "unknown";

pub const EMOJI_ADDED: &str = "emojiAdded";
pub const EMOJI_UPDATED: &str = "emojiUpdated";
pub const EMOJI_DELETED: &str = "emojiDeleted";

/// EmojiRecord is one custom emoji as reported by the stream.
///
/// Every field is read defensively: an absent key, a null value and a
/// value of the wrong JSON type all end up as `None` (or an empty list)
/// instead of rejecting the whole record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmojiRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub license: Option<String>,
    pub local_only: Option<bool>,
    pub aliases: Vec<String>,
}

impl EmojiRecord {
    /// Reads a record out of an emoji JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            name: string_field(object, "name"),
            category: string_field(object, "category"),
            license: string_field(object, "license"),
            local_only: object.get("localOnly").and_then(Value::as_bool),
            aliases: object
                .get("aliases")
                .and_then(Value::as_array)
                .map(|aliases| {
                    aliases
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn license(&self) -> &str {
        self.license.as_deref().unwrap_or(UNKNOWN)
    }

    /// "true", "false" or [`UNKNOWN`]
    pub fn local_only(&self) -> &'static str {
        match self.local_only {
            Some(true) => "true",
            Some(false) => "false",
            None => UNKNOWN,
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// EventKind is the closed set of stream events this crate understands.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Added(EmojiRecord),
    Updated(Vec<EmojiRecord>),
    Deleted(Vec<EmojiRecord>),
    Unrecognized(String),
}

impl EventKind {
    /// Validates the envelope body against the shape its type tag requires.
    ///
    /// Unknown type tags are not an error; they become
    /// [`EventKind::Unrecognized`].
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, InvalidShapeError> {
        shape::extract(envelope)
    }

    /// The stream type tag this event was decoded from
    pub fn event_type(&self) -> &str {
        match self {
            EventKind::Added(_) => EMOJI_ADDED,
            EventKind::Updated(_) => EMOJI_UPDATED,
            EventKind::Deleted(_) => EMOJI_DELETED,
            EventKind::Unrecognized(event_type) => event_type,
        }
    }
}
