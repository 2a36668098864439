use crate::formatter;
use crate::misskey::{DeliveryScope, NoteClient};
use anyhow::{Context, Result};
use async_trait::async_trait;
use mk_stream::event::{EMOJI_ADDED, EMOJI_DELETED, EMOJI_UPDATED};
use mk_stream::{EmojiRecord, EventHandler};
use tracing::info;

/// Posts a note for every emoji event the router dispatches.
pub struct EmojiNotifier {
    client: NoteClient,
    scope: DeliveryScope,
}

impl EmojiNotifier {
    pub fn new(client: NoteClient, scope: DeliveryScope) -> Self {
        Self { client, scope }
    }

    async fn announce(&self, event: &'static str, emoji: &EmojiRecord, text: String) -> Result<()> {
        self.client
            .publish(&text, self.scope)
            .await
            .with_context(|| format!("Failed to post {} note for '{}'", event, emoji.name()))?;

        info!(event_type = event, emoji = emoji.name(), scope = ?self.scope, "Posted note");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for EmojiNotifier {
    async fn emoji_added(&self, emoji: &EmojiRecord) -> Result<()> {
        self.announce(EMOJI_ADDED, emoji, formatter::format_added(emoji))
            .await
    }

    async fn emoji_updated(&self, emoji: &EmojiRecord) -> Result<()> {
        self.announce(EMOJI_UPDATED, emoji, formatter::format_updated(emoji))
            .await
    }

    async fn emoji_deleted(&self, emoji: &EmojiRecord) -> Result<()> {
        self.announce(EMOJI_DELETED, emoji, formatter::format_deleted(emoji))
            .await
    }
}
