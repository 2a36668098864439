//! Emoji Notifier - Posts a note whenever a custom emoji changes.
//!
//! Consumes the `mk-stream` main channel and turns each emoji event into a
//! formatted note on the same instance.
//!
//! # Architecture
//!
//! ```text
//!   Misskey streaming API (wss://<host>/streaming)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       mk_stream::ConnectionManager      │
//! │  - Subscribe to the main channel        │
//! │  - Receive loop + reconnection          │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       mk_stream::Router                 │
//! │  - Decode envelope, validate shape      │
//! │  - Dispatch emojiAdded/Updated/Deleted  │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       EmojiNotifier (EventHandler)      │
//! │  - Format note text                     │
//! │  - Publish via NoteClient               │
//! └─────────────────────────────────────────┘
//!          ↓
//!   POST https://<host>/api/notes/create
//! ```
//!
//! # Core Types
//!
//! - [`EmojiNotifier`] - [`mk_stream::EventHandler`] that posts notes
//! - [`NoteClient`] - Misskey notes API client
//! - [`DeliveryScope`] - Local, home or followers delivery
//! - [`NotifierConfig`] - Stream config plus the `[notes]` section

pub mod config;
pub mod formatter;
pub mod handlers;
pub mod misskey;

pub use config::{NoteSettings, NotifierConfig};
pub use handlers::EmojiNotifier;
pub use misskey::{DeliveryScope, NoteClient, PublishError};
