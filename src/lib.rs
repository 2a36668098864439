// Inbound frame decoding and outbound control frames
pub mod envelope;

// Emoji event model and body shape validation
pub mod event;

// Envelope dispatch to event handlers
pub mod router;

// Stream session lifecycle and reconnection
pub mod connection;

// Environment and file configuration
pub mod config;

pub use connection::{
    ConnectionError, ConnectionManager, ConnectionState, ConnectionStatus, ReconnectPolicy, WsDialer,
};
pub use config::{ConfigError, StreamConfig};
pub use envelope::{ControlFrame, Envelope, SubscriptionId};
pub use event::{EmojiRecord, EventKind};
pub use router::{EventHandler, RouteOutcome, Router};
