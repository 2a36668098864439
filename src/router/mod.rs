//! Event router - Turns decoded envelopes into handler calls.
//!
//! Every frame ends in exactly one [`RouteOutcome`]. Failures are logged
//! here and never propagate to the connection manager.

use crate::envelope::{self, DecodeError, Envelope};
use crate::event::{
    EmojiRecord, EventKind, InvalidShapeError, EMOJI_ADDED, EMOJI_DELETED, EMOJI_UPDATED,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

#[cfg(test)]
mod tests;

/// Handler registry interface, one capability per emoji event.
///
/// Implementations format the event and hand it to a publishing sink.
/// Returned errors are logged by the router and the frame is dropped.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn emoji_added(&self, emoji: &EmojiRecord) -> Result<()>;

    async fn emoji_updated(&self, emoji: &EmojiRecord) -> Result<()>;

    async fn emoji_deleted(&self, emoji: &EmojiRecord) -> Result<()>;
}

/// What happened to one inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Handler ran to completion
    Dispatched(&'static str),
    /// Handler ran and returned an error
    HandlerFailed(&'static str),
    /// Type tag not handled here
    Unrecognized(String),
    /// Update/delete batch without any records
    Empty(&'static str),
    Undecodable(DecodeError),
    InvalidShape(InvalidShapeError),
}

impl RouteOutcome {
    /// True when a handler was invoked for the frame
    pub fn is_dispatch(&self) -> bool {
        matches!(
            self,
            RouteOutcome::Dispatched(_) | RouteOutcome::HandlerFailed(_)
        )
    }
}

/// Routes envelopes to an [`EventHandler`]
#[derive(Clone)]
pub struct Router {
    handler: Arc<dyn EventHandler>,
}

impl Router {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self { handler }
    }

    /// Decode raw frame bytes and route the result
    pub async fn route_frame(&self, raw: &[u8]) -> RouteOutcome {
        match envelope::decode(raw) {
            Ok(envelope) => self.route(&envelope).await,
            Err(e) => {
                error!(error = %e, bytes = raw.len(), "Dropping undecodable frame");
                RouteOutcome::Undecodable(e)
            }
        }
    }

    /// Validate the envelope body and dispatch the resulting event
    pub async fn route(&self, envelope: &Envelope) -> RouteOutcome {
        match EventKind::from_envelope(envelope) {
            Ok(event) => self.dispatch(event).await,
            Err(e) => {
                error!(
                    event_type = %e.event_type,
                    field = %e.field,
                    expected = e.expected,
                    found = e.found,
                    "Dropping frame with invalid body shape"
                );
                RouteOutcome::InvalidShape(e)
            }
        }
    }

    /// Invoke the handler capability matching the event.
    ///
    /// Update and delete batches only relay their first record.
    pub async fn dispatch(&self, event: EventKind) -> RouteOutcome {
        match event {
            EventKind::Added(emoji) => {
                info!(event_type = EMOJI_ADDED, name = %emoji.name(), "Received emoji event");
                let result = self.handler.emoji_added(&emoji).await;
                finish(EMOJI_ADDED, result)
            }
            EventKind::Updated(emojis) => match first_record(EMOJI_UPDATED, &emojis) {
                Some(emoji) => {
                    let result = self.handler.emoji_updated(emoji).await;
                    finish(EMOJI_UPDATED, result)
                }
                None => RouteOutcome::Empty(EMOJI_UPDATED),
            },
            EventKind::Deleted(emojis) => match first_record(EMOJI_DELETED, &emojis) {
                Some(emoji) => {
                    let result = self.handler.emoji_deleted(emoji).await;
                    finish(EMOJI_DELETED, result)
                }
                None => RouteOutcome::Empty(EMOJI_DELETED),
            },
            EventKind::Unrecognized(event_type) => {
                info!(event_type = %event_type, "Ignoring unrecognized event type");
                RouteOutcome::Unrecognized(event_type)
            }
        }
    }
}

fn first_record<'a>(event_type: &'static str, emojis: &'a [EmojiRecord]) -> Option<&'a EmojiRecord> {
    match emojis {
        [] => {
            warn!(event_type, "No emoji data found in event");
            None
        }
        [first, rest @ ..] => {
            info!(event_type, name = %first.name(), "Received emoji event");
            if !rest.is_empty() {
                // Batches are truncated to their first record.
                warn!(
                    event_type,
                    skipped = rest.len(),
                    "Emoji batch has more than one record, relaying only the first"
                );
            }
            Some(first)
        }
    }
}

fn finish(event_type: &'static str, result: Result<()>) -> RouteOutcome {
    match result {
        Ok(()) => RouteOutcome::Dispatched(event_type),
        Err(e) => {
            error!(event_type, error = %e, "Event handler failed");
            RouteOutcome::HandlerFailed(event_type)
        }
    }
}
