use anyhow::{Context, Result};
use emoji_notifier::{EmojiNotifier, NoteClient, NotifierConfig};
use mk_stream::config::load_dotenv;
use mk_stream::{ConnectionManager, ConnectionState, Router, WsDialer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Wait after stop() so in-flight log lines and close frames get out
const EXIT_GRACE: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emoji_notifier=info,mk_stream=info".into()),
        )
        .init();

    info!("Emoji Notifier starting...");

    load_dotenv();
    let config = NotifierConfig::from_env().context("Invalid configuration")?;

    info!(
        host = %config.stream.host,
        scope = ?config.notes.scope,
        max_attempts = config.stream.reconnect.max_attempts,
        delay_ms = config.stream.reconnect.delay_ms,
        "Configuration loaded"
    );

    let client = NoteClient::new(config.stream.notes_endpoint(), config.stream.token.clone())
        .context("Failed to build note client")?;
    let notifier = Arc::new(EmojiNotifier::new(client, config.notes.scope));
    let router = Router::new(notifier);

    let dialer = Arc::new(WsDialer::new(config.stream.streaming_url()));
    let mut manager = ConnectionManager::new(dialer, router, config.stream.reconnect.clone());
    info!(subscription_id = %manager.subscription_id(), "Connecting to streaming API");

    manager
        .start()
        .await
        .context("Failed to connect to streaming API")?;
    manager
        .listen()
        .await
        .context("Failed to start receive loop")?;

    let mut state = manager.subscribe_state();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown signal received");
        }
        _ = state.wait_for(|s| *s == ConnectionState::Closed) => {
            warn!("Stream connection closed, exiting");
        }
    }

    manager.stop().await;
    tokio::time::sleep(EXIT_GRACE).await;

    info!("Emoji Notifier stopped");
    Ok(())
}
