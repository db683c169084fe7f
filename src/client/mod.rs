//! Notification delivery client.
//!
//! Keeps one push connection to the notification channel per session and fans
//! each received notification out to registered handlers.
//!
//! # Connection lifecycle
//!
//! - `connect(credential)` opens a transport unless one with the same
//!   credential is already connecting or open. Every explicit call resets the
//!   reconnect budget.
//! - When a transport fails to open or is lost, a single reconnect is
//!   scheduled after `min(initial * 2^attempt, max)`. After `max_attempts`
//!   automatic reconnects the client stays disconnected until the next explicit
//!   `connect`, and unread counts rely on polling alone.
//! - `disconnect()` cancels the pending reconnect and closes the transport in
//!   one step. Every transport and timer carries the generation it was created
//!   under; anything from an older generation is ignored.
//!
//! Transport errors never reach callers; they only drive the reconnect loop.

mod backoff;
mod state;
mod subscribers;

pub use backoff::{BackoffConfig, ReconnectBackoff};
pub use state::{ClientStats, ConnectionState};
pub use subscribers::{NotificationHandler, SubscriberRegistry, SubscriptionId};

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::PushConfig;
use crate::metrics::{MessageMetrics, PushMetrics};
use crate::notification::NotificationEvent;
use crate::websocket::{push_url, PushConnector, PushFrame, PushMessage, PushStream};

use state::ClientCounters;

/// Live notification client for one authenticated session.
///
/// Background work runs on Tokio tasks, so `connect` must be called from
/// within a Tokio runtime. Dropping the client disconnects it.
pub struct NotificationClient {
    inner: Arc<Inner>,
}

struct Inner {
    push_base_url: String,
    connector: Arc<dyn PushConnector>,
    subscribers: SubscriberRegistry,
    control: Mutex<Control>,
    state_tx: watch::Sender<ConnectionState>,
    counters: ClientCounters,
}

struct Control {
    credential: Option<String>,
    backoff: ReconnectBackoff,
    generation: u64,
    reconnect_timer: Option<JoinHandle<()>>,
    transport: Option<TransportHandle>,
    /// Last transport told to shut down; the next one waits for it to finish
    closing: Option<JoinHandle<()>>,
}

struct TransportHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl NotificationClient {
    pub fn new(config: &PushConfig, connector: Arc<dyn PushConnector>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(Inner {
                push_base_url: config.base_url.clone(),
                connector,
                subscribers: SubscriberRegistry::new(),
                control: Mutex::new(Control {
                    credential: None,
                    backoff: ReconnectBackoff::with_config(BackoffConfig::from(config)),
                    generation: 0,
                    reconnect_timer: None,
                    transport: None,
                    closing: None,
                }),
                state_tx,
                counters: ClientCounters::default(),
            }),
        }
    }

    /// Connect to the push channel with the given credential.
    ///
    /// No-op when a transport with the same credential is already connecting
    /// or open. A different credential replaces the current transport.
    pub fn connect(&self, credential: impl Into<String>) {
        self.inner.connect(credential.into());
    }

    /// Stop the client until the next explicit `connect`.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Register a handler for received notifications.
    pub fn on_notification<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(handler)
    }

    /// Remove one registration. Other handlers are unaffected.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Receiver that observes every connection state change
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Whether a reconnect timer is currently armed
    pub fn has_pending_reconnect(&self) -> bool {
        self.inner.lock().reconnect_timer.is_some()
    }

    pub fn stats(&self) -> ClientStats {
        let attempt = self.inner.lock().backoff.attempt();
        self.inner.counters.snapshot(self.state(), attempt)
    }
}

impl Drop for NotificationClient {
    fn drop(&mut self) {
        self.inner.disconnect();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            PushMetrics::set_state(state as i64);
            tracing::debug!(from = %previous, to = %state, "Push connection state changed");
        }
    }

    fn connect(self: &Arc<Self>, credential: String) {
        let mut ctl = self.lock();
        ctl.backoff.reset();

        if ctl.credential.as_deref() == Some(credential.as_str()) && ctl.transport.is_some() {
            tracing::debug!("Push channel already connecting or open, ignoring connect");
            return;
        }

        self.teardown(&mut ctl);
        ctl.credential = Some(credential);
        tracing::info!("Connecting to notification push channel");
        self.set_state(ConnectionState::Connecting);
        self.open_transport(&mut ctl);
    }

    fn disconnect(&self) {
        let mut ctl = self.lock();
        let was_active = ctl.credential.is_some();
        ctl.credential = None;
        self.teardown(&mut ctl);
        self.set_state(ConnectionState::Disconnected);
        drop(ctl);

        if was_active {
            tracing::info!("Disconnected from notification push channel");
        }
    }

    /// Cancel the pending timer and shut the transport down. Bumping the
    /// generation makes anything still in flight from them inert.
    fn teardown(&self, ctl: &mut Control) {
        ctl.generation += 1;

        if let Some(timer) = ctl.reconnect_timer.take() {
            timer.abort();
        }

        if let Some(transport) = ctl.transport.take() {
            let _ = transport.shutdown.send(());
            ctl.closing = Some(transport.task);
        }
    }

    fn open_transport(self: &Arc<Self>, ctl: &mut Control) {
        let Some(credential) = ctl.credential.clone() else {
            return;
        };

        ctl.generation += 1;
        let generation = ctl.generation;
        let previous = ctl.closing.take();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            inner
                .run_transport(credential, generation, previous, shutdown_rx)
                .await;
        });

        ctl.transport = Some(TransportHandle {
            shutdown: shutdown_tx,
            task,
        });
    }

    async fn run_transport(
        self: Arc<Self>,
        credential: String,
        generation: u64,
        previous: Option<JoinHandle<()>>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        // Never overlap with the transport being replaced
        if let Some(previous) = previous {
            let _ = previous.await;
        }

        let url = match push_url(&self.push_base_url, &credential) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid push channel URL");
                PushMetrics::record_connect_failure();
                self.transport_ended(generation);
                return;
            }
        };

        self.counters.connect_attempts.fetch_add(1, Ordering::Relaxed);
        PushMetrics::record_attempt();

        let connected = tokio::select! {
            _ = &mut shutdown => return,
            result = self.connector.connect(&url) => result,
        };

        let mut stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Push channel connection failed");
                PushMetrics::record_connect_failure();
                self.transport_ended(generation);
                return;
            }
        };

        if !self.mark_open(generation) {
            stream.close().await;
            return;
        }

        tracing::info!("Push channel connection established");
        PushMetrics::record_opened();

        if self.read_frames(stream.as_mut(), generation, &mut shutdown).await {
            stream.close().await;
            return;
        }

        PushMetrics::record_closed();
        self.transport_ended(generation);
    }

    /// Read until the transport ends. Returns `true` if asked to shut down.
    async fn read_frames(
        &self,
        stream: &mut dyn PushStream,
        generation: u64,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> bool {
        loop {
            let frame = tokio::select! {
                _ = &mut *shutdown => return true,
                frame = stream.next_frame() => frame,
            };

            match frame {
                Some(PushFrame::Text(text)) => {
                    if !self.is_current(generation) {
                        return true;
                    }
                    self.handle_text(&text);
                }
                Some(PushFrame::Close(info)) => {
                    tracing::info!(
                        code = info.as_ref().map(|i| i.code),
                        reason = info.as_ref().map(|i| i.reason.as_str()).unwrap_or(""),
                        "Push channel closed by server"
                    );
                    return false;
                }
                Some(PushFrame::Error(e)) => {
                    tracing::warn!(error = %e, "Push channel transport error");
                    return false;
                }
                None => {
                    tracing::info!("Push channel stream ended");
                    return false;
                }
            }
        }
    }

    fn handle_text(&self, text: &str) {
        match PushMessage::from_json(text) {
            Ok(message) => {
                let notification = message.into_notification();
                self.counters
                    .notifications_received
                    .fetch_add(1, Ordering::Relaxed);
                MessageMetrics::record_received();

                let delivered = self.subscribers.dispatch(&notification);
                tracing::debug!(
                    notification_id = %notification.id,
                    notification_type = %notification.notification_type,
                    delivered = delivered,
                    "Dispatched push notification"
                );
            }
            Err(e) => {
                self.counters
                    .messages_discarded
                    .fetch_add(1, Ordering::Relaxed);
                MessageMetrics::record_discarded();
                tracing::warn!(error = %e, "Discarding unrecognized push message");
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    fn mark_open(&self, generation: u64) -> bool {
        let ctl = self.lock();
        if ctl.generation != generation {
            return false;
        }
        self.set_state(ConnectionState::Open);
        true
    }

    fn transport_ended(self: &Arc<Self>, generation: u64) {
        let mut ctl = self.lock();
        if ctl.generation != generation {
            return;
        }
        ctl.transport = None;
        self.schedule_reconnect(&mut ctl);
    }

    fn schedule_reconnect(self: &Arc<Self>, ctl: &mut Control) {
        if ctl.credential.is_none() {
            self.set_state(ConnectionState::Disconnected);
            return;
        }
        if ctl.reconnect_timer.is_some() {
            return;
        }

        let Some(delay) = ctl.backoff.next_delay() else {
            tracing::warn!(
                max_attempts = ctl.backoff.max_attempts(),
                "Push reconnect attempts exhausted, falling back to polling"
            );
            PushMetrics::record_reconnects_exhausted();
            self.set_state(ConnectionState::Disconnected);
            return;
        };

        self.set_state(ConnectionState::Reconnecting);
        self.counters
            .reconnects_scheduled
            .fetch_add(1, Ordering::Relaxed);
        PushMetrics::record_reconnect_scheduled();
        tracing::info!(
            attempt = ctl.backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            "Scheduling push channel reconnect"
        );

        let generation = ctl.generation;
        let inner = Arc::clone(self);
        ctl.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire_reconnect(generation);
        }));
    }

    fn fire_reconnect(self: &Arc<Self>, generation: u64) {
        let mut ctl = self.lock();
        if ctl.generation != generation {
            return;
        }
        ctl.reconnect_timer = None;
        self.open_transport(&mut ctl);
    }
}
