use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Channel every session subscribes to
pub const MAIN_CHANNEL: &str = "main";

/// Identifier correlating a session's connect and disconnect frames.
///
/// Generated once per connection manager and reused across reconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Client → Server control frames
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "body")]
pub enum ControlFrame {
    #[serde(rename = "connect")]
    Connect { channel: String, id: SubscriptionId },
    #[serde(rename = "disconnect")]
    Disconnect { id: SubscriptionId },
}

impl ControlFrame {
    /// Subscribe frame for the main channel
    pub fn subscribe(id: SubscriptionId) -> Self {
        ControlFrame::Connect {
            channel: MAIN_CHANNEL.to_string(),
            id,
        }
    }

    /// Unsubscribe frame for a previously subscribed id
    pub fn unsubscribe(id: SubscriptionId) -> Self {
        ControlFrame::Disconnect { id }
    }

    /// Serialize to the JSON text sent over the wire
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
