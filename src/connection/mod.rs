// Stream connection lifecycle

mod manager;
mod policy;
mod transport;

pub use manager::ConnectionManager;
pub use policy::ReconnectPolicy;
pub use transport::{Dialer, Frame, FrameReader, FrameWriter, WsDialer};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a [`ConnectionManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    ClosingDown,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::ClosingDown => "closing_down",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Counters for one connection manager.
///
/// Serializable so a binary can dump it as a diagnostics snapshot.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConnectionStatus {
    /// Text/binary frames read from the stream
    pub frames_received: u64,
    /// Frames that produced no handler call
    pub frames_dropped: u64,
    /// Frames that reached a handler
    pub events_dispatched: u64,
    /// Successful reconnections since start
    pub reconnect_count: u64,
    /// Last time a subscribe frame was accepted by the transport
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Last read or reconnection error (if any)
    pub last_error: Option<String>,
}

/// Transport and session errors
#[derive(Debug)]
pub enum ConnectionError {
    /// Control frame could not be serialized
    Encode(serde_json::Error),
    /// Transport could not be opened
    Open(anyhow::Error),
    /// Subscribe frame could not be sent
    Subscribe(anyhow::Error),
    /// Dial and subscribe did not finish within the connect timeout
    Timeout(Duration),
    /// `listen` called without an open session
    NotConnected,
    /// `listen` called while a receive loop is running
    AlreadyListening,
    /// Stop was requested while the session was being opened
    Cancelled,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Encode(e) => write!(f, "failed to encode control frame: {}", e),
            ConnectionError::Open(e) => write!(f, "failed to open stream transport: {:#}", e),
            ConnectionError::Subscribe(e) => write!(f, "failed to send subscribe frame: {:#}", e),
            ConnectionError::Timeout(limit) => write!(
                f,
                "stream connection timed out after {} ms",
                limit.as_millis()
            ),
            ConnectionError::NotConnected => write!(f, "no open stream session"),
            ConnectionError::AlreadyListening => write!(f, "receive loop is already running"),
            ConnectionError::Cancelled => write!(f, "stop requested while connecting"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Encode(e) => Some(e),
            _ => None,
        }
    }
}
