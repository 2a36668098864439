use super::policy::ReconnectPolicy;
use super::transport::{Dialer, Frame, FrameReader, FrameWriter};
use super::{ConnectionError, ConnectionState, ConnectionStatus};
use crate::envelope::{ControlFrame, SubscriptionId};
use crate::router::Router;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};


const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Manages the stream session: subscribe, receive loop, reconnection, shutdown.
///
/// # Lifecycle
/// 1. `start()` opens the transport and sends the subscribe frame
/// 2. `listen()` spawns the receive loop on the open session
/// 3. Read failures run the [`ReconnectPolicy`] inside the loop
/// 4. `stop()` cancels the loop, unsubscribes and releases the transport
///
/// `start` and `stop` must be called from one control flow; the only
/// coordination with the receive loop is the cancellation flag and the
/// writer slot.
pub struct ConnectionManager {
    shared: Arc<Shared>,
    /// Receive loop task handle
    listener: Option<JoinHandle<()>>,
    shutdown_grace: Duration,
}

/// State shared between the manager and its receive loop
struct Shared {
    dialer: Arc<dyn Dialer>,
    router: Router,
    policy: ReconnectPolicy,
    subscription_id: SubscriptionId,
    /// Write half of the current session; `None` once released
    writer: Mutex<Option<Box<dyn FrameWriter>>>,
    /// Read half opened by `start()`, waiting to be picked up by the loop
    reader: Mutex<Option<Box<dyn FrameReader>>>,
    state: watch::Sender<ConnectionState>,
    cancel: watch::Sender<bool>,
    status: Mutex<ConnectionStatus>,
}

impl ConnectionManager {
    /// Creates an idle manager with a fresh subscription id.
    pub fn new(dialer: Arc<dyn Dialer>, router: Router, policy: ReconnectPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (cancel, _) = watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                dialer,
                router,
                policy,
                subscription_id: SubscriptionId::new(),
                writer: Mutex::new(None),
                reader: Mutex::new(None),
                state,
                cancel,
                status: Mutex::new(ConnectionStatus::default()),
            }),
            listener: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// How long `stop()` waits for the receive loop before aborting it
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.shared.subscription_id
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Watch state transitions (e.g. to notice the loop giving up)
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the session counters
    pub async fn status(&self) -> ConnectionStatus {
        self.shared.status.lock().await.clone()
    }

    /// Opens the transport and sends the subscribe frame.
    ///
    /// Never retries; retrying is the receive loop's job.
    pub async fn start(&self) -> Result<(), ConnectionError> {
        self.shared.connect().await
    }

    /// Spawns the receive loop on the session opened by `start()`.
    pub async fn listen(&mut self) -> Result<(), ConnectionError> {
        if self.listener.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ConnectionError::AlreadyListening);
        }

        let reader = self
            .shared
            .reader
            .lock()
            .await
            .take()
            .ok_or(ConnectionError::NotConnected)?;

        let cancel = self.shared.cancel.subscribe();
        let shared = Arc::clone(&self.shared);
        self.listener = Some(tokio::spawn(shared.receive_loop(reader, cancel)));

        Ok(())
    }

    /// Cancels the receive loop, unsubscribes and releases the transport.
    ///
    /// Only the first call does anything; later calls are logged no-ops.
    pub async fn stop(&mut self) {
        if self.shared.cancel.send_replace(true) {
            debug!("Stop already requested, ignoring");
            return;
        }

        info!(subscription_id = %self.shared.subscription_id, "Stopping stream connection");
        self.shared.set_state(ConnectionState::ClosingDown);

        let writer = self.shared.writer.lock().await.take();
        match writer {
            Some(writer) => self.shared.release(writer, true).await,
            None => debug!("No open transport to release"),
        }

        // Session opened by start() but never handed to a receive loop
        self.shared.reader.lock().await.take();

        if let Some(mut handle) = self.listener.take() {
            match tokio::time::timeout(self.shutdown_grace, &mut handle).await {
                Ok(Ok(())) => debug!("Receive loop finished"),
                Ok(Err(e)) => error!(error = %e, "Receive loop task failed"),
                Err(_) => {
                    warn!(
                        grace_ms = self.shutdown_grace.as_millis() as u64,
                        "Receive loop did not finish in time, aborting"
                    );
                    handle.abort();
                }
            }
        }

        self.shared.set_state(ConnectionState::Closed);
        info!("Stream connection closed");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.abort();
        }
    }
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Open a session and subscribe to the main channel.
    async fn connect(&self) -> Result<(), ConnectionError> {
        let frame = ControlFrame::subscribe(self.subscription_id)
            .encode()
            .map_err(|e| {
                error!(error = %e, "Failed to encode subscribe frame");
                ConnectionError::Encode(e)
            })?;

        let previous = *self.state.borrow();
        self.set_state(ConnectionState::Connecting);

        match self.open_session(&frame).await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                self.status.lock().await.last_connected_at = Some(Utc::now());
                info!(subscription_id = %self.subscription_id, "Subscribed to main channel");
                Ok(())
            }
            Err(e) => {
                if !self.is_cancelled() {
                    self.set_state(previous);
                }
                Err(e)
            }
        }
    }

    async fn open_session(&self, subscribe_frame: &str) -> Result<(), ConnectionError> {
        let limit = self.policy.connect_timeout();
        let handshake = async {
            let (mut writer, reader) = self.dialer.dial().await.map_err(ConnectionError::Open)?;
            if let Err(e) = writer.send_text(subscribe_frame).await {
                self.release(writer, false).await;
                return Err(ConnectionError::Subscribe(e));
            }
            Ok::<_, ConnectionError>((writer, reader))
        };
        let (writer, reader) = match tokio::time::timeout(limit, handshake).await {
            Ok(opened) => opened?,
            Err(_) => return Err(ConnectionError::Timeout(limit)),
        };

        let stale = {
            let mut slot = self.writer.lock().await;
            // Checked under the writer lock so stop() either sees this
            // session or this call sees the cancellation.
            if self.is_cancelled() {
                drop(slot);
                self.release(writer, false).await;
                return Err(ConnectionError::Cancelled);
            }
            slot.replace(writer)
        };
        if let Some(stale) = stale {
            self.release(stale, false).await;
        }

        *self.reader.lock().await = Some(reader);
        Ok(())
    }

    /// Close a session's write half, unsubscribing first if asked to.
    async fn release(&self, mut writer: Box<dyn FrameWriter>, unsubscribe: bool) {
        if unsubscribe {
            match ControlFrame::unsubscribe(self.subscription_id).encode() {
                Ok(frame) => {
                    if let Err(e) = writer.send_text(&frame).await {
                        error!(error = %e, "Failed to send disconnect frame");
                    }
                }
                Err(e) => error!(error = %e, "Failed to encode disconnect frame"),
            }
            if let Err(e) = writer.send_close().await {
                warn!(error = %e, "Failed to send close frame");
            }
        }
        if let Err(e) = writer.close().await {
            debug!(error = %e, "Transport close reported an error");
        }
    }

    /// Receive loop: one frame at a time, in arrival order.
    async fn receive_loop(
        self: Arc<Self>,
        mut reader: Box<dyn FrameReader>,
        mut cancel: watch::Receiver<bool>,
    ) {
        info!(subscription_id = %self.subscription_id, "Receive loop started");

        loop {
            if *cancel.borrow() {
                break;
            }

            let next = tokio::select! {
                _ = cancel.changed() => break,
                next = reader.recv() => next,
            };

            let failure = match next {
                Some(Ok(Frame::Text(text))) => {
                    self.handle_frame(text.as_bytes()).await;
                    continue;
                }
                Some(Ok(Frame::Binary(data))) => {
                    self.handle_frame(&data).await;
                    continue;
                }
                Some(Ok(Frame::Ping | Frame::Pong)) => continue,
                Some(Ok(Frame::Close { code, reason })) => {
                    format!("server closed the stream (code {}: {})", code, reason)
                }
                Some(Err(e)) => format!("{:#}", e),
                None => "stream ended".to_string(),
            };

            if self.is_cancelled() {
                break;
            }

            error!(error = %failure, "Message reading error");
            self.status.lock().await.last_error = Some(failure);

            match self.reconnect(&mut cancel).await {
                Some(new_reader) => reader = new_reader,
                None => break,
            }
        }

        info!("Receive loop stopped");
    }

    async fn handle_frame(&self, raw: &[u8]) {
        debug!(bytes = raw.len(), "Received frame");
        let outcome = self.router.route_frame(raw).await;

        let mut status = self.status.lock().await;
        status.frames_received += 1;
        if outcome.is_dispatch() {
            status.events_dispatched += 1;
        } else {
            status.frames_dropped += 1;
        }
    }

    /// Run the reconnection policy.
    ///
    /// Returns the new session's reader, or `None` when cancelled or when
    /// every attempt failed.
    async fn reconnect(&self, cancel: &mut watch::Receiver<bool>) -> Option<Box<dyn FrameReader>> {
        self.set_state(ConnectionState::Reconnecting);
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            let delay = self.policy.delay_for(attempt);
            info!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Attempting to reconnect"
            );

            tokio::select! {
                _ = cancel.changed() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            if self.is_cancelled() {
                return None;
            }

            // A hung handshake is bounded by the connect timeout; stop()
            // must not have to wait for it either.
            let outcome = tokio::select! {
                _ = cancel.changed() => return None,
                result = self.connect() => result,
            };

            match outcome {
                Ok(()) => {
                    if let Some(reader) = self.reader.lock().await.take() {
                        self.status.lock().await.reconnect_count += 1;
                        info!(attempt = attempt, "Successfully reconnected");
                        return Some(reader);
                    }
                }
                Err(ConnectionError::Cancelled) => return None,
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Reconnection attempt failed"
                    );
                    self.status.lock().await.last_error = Some(e.to_string());
                }
            }
        }

        error!(max_attempts = max_attempts, "Reconnection attempts exhausted, giving up");
        if let Some(writer) = self.writer.lock().await.take() {
            self.release(writer, false).await;
        }
        self.set_state(ConnectionState::Closed);
        None
    }
}
