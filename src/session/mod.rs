//! Per-session wiring of the notification client, REST API, poller and UI
//! consumers.
//!
//! A session is created once per authenticated credential and disposed on
//! logout. Creating it connects the push channel, starts the unread-count
//! poller and subscribes the badge counter and toast queue; disposing it
//! undoes all of that.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::{NotificationsApi, UnreadCountSource};
use crate::client::{ConnectionState, NotificationClient, SubscriptionId};
use crate::config::Settings;
use crate::consumers::{ToastQueue, UnreadCounter};
use crate::error::{ApiError, Result};
use crate::notification::{Notification, NotificationFilter, NotificationListItem};
use crate::tasks::UnreadCountPoller;
use crate::websocket::{PushConnector, TungsteniteConnector};

pub struct NotificationSession {
    client: NotificationClient,
    api: NotificationsApi,
    unread: UnreadCounter,
    toasts: ToastQueue,
    subscriptions: Vec<SubscriptionId>,
    shutdown_tx: broadcast::Sender<()>,
    poller_handle: Option<JoinHandle<()>>,
}

impl NotificationSession {
    /// Start a session over WebSocket push and the REST API.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create(settings: &Settings, credential: impl Into<String>) -> Result<Self> {
        let credential = credential.into();
        let api = NotificationsApi::new(&settings.api, credential.clone())?;
        let source: Arc<dyn UnreadCountSource> = Arc::new(api.clone());

        Ok(Self::start(
            settings,
            credential,
            api,
            Arc::new(TungsteniteConnector),
            source,
        ))
    }

    /// Start a session with a custom push transport and unread-count source
    pub fn with_transport(
        settings: &Settings,
        credential: impl Into<String>,
        connector: Arc<dyn PushConnector>,
        source: Arc<dyn UnreadCountSource>,
    ) -> Result<Self> {
        let credential = credential.into();
        let api = NotificationsApi::new(&settings.api, credential.clone())?;
        Ok(Self::start(settings, credential, api, connector, source))
    }

    fn start(
        settings: &Settings,
        credential: String,
        api: NotificationsApi,
        connector: Arc<dyn PushConnector>,
        source: Arc<dyn UnreadCountSource>,
    ) -> Self {
        let client = NotificationClient::new(&settings.push, connector);
        let unread = UnreadCounter::new();
        let toasts = ToastQueue::new(Duration::from_secs(settings.toast.dismiss_after_secs));

        let counter = unread.clone();
        let badge_subscription = client.on_notification(move |_| counter.increment());
        let queue = toasts.clone();
        let toast_subscription = client.on_notification(move |event| queue.push(event));

        let (shutdown_tx, _) = broadcast::channel(1);
        let poller = UnreadCountPoller::new(
            Duration::from_secs(settings.polling.interval_secs),
            source,
            unread.clone(),
            shutdown_tx.subscribe(),
        );
        let poller_handle = tokio::spawn(poller.run());

        client.connect(credential);
        tracing::info!("Notification session started");

        Self {
            client,
            api,
            unread,
            toasts,
            subscriptions: vec![badge_subscription, toast_subscription],
            shutdown_tx,
            poller_handle: Some(poller_handle),
        }
    }

    pub fn client(&self) -> &NotificationClient {
        &self.client
    }

    pub fn api(&self) -> &NotificationsApi {
        &self.api
    }

    pub fn unread(&self) -> &UnreadCounter {
        &self.unread
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client.state()
    }

    pub fn is_active(&self) -> bool {
        self.poller_handle.is_some()
    }

    /// Fetch the unread count now and reset the badge to it
    pub async fn refresh_unread(&self) -> std::result::Result<u64, ApiError> {
        let count = self.api.get_unread_count().await?.unread_count;
        self.unread.reset(count);
        Ok(count)
    }

    pub async fn notifications(
        &self,
        filter: &NotificationFilter,
    ) -> std::result::Result<Vec<NotificationListItem>, ApiError> {
        self.api.list(filter).await
    }

    /// Mark one notification read, then re-sync the badge
    pub async fn mark_as_read(&self, id: Uuid) -> std::result::Result<Notification, ApiError> {
        let notification = self.api.mark_as_read(id).await?;
        self.refresh_unread().await?;
        Ok(notification)
    }

    /// Mark everything read; the badge drops to zero
    pub async fn mark_all_read(&self) -> std::result::Result<u64, ApiError> {
        let marked = self.api.mark_all_read().await?.marked_count;
        self.unread.reset(0);
        Ok(marked)
    }

    /// Delete one notification, then re-sync the badge
    pub async fn delete(&self, id: Uuid) -> std::result::Result<(), ApiError> {
        self.api.delete(id).await?;
        self.refresh_unread().await?;
        Ok(())
    }

    /// Tear the session down. Safe to call more than once.
    pub fn dispose(&mut self) {
        let Some(poller_handle) = self.poller_handle.take() else {
            return;
        };

        for id in self.subscriptions.drain(..) {
            self.client.unsubscribe(id);
        }
        self.client.disconnect();

        if self.shutdown_tx.send(()).is_err() {
            poller_handle.abort();
        }
        self.toasts.clear();

        tracing::info!("Notification session disposed");
    }
}

impl Drop for NotificationSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::error::TransportError;
    use crate::websocket::{PushFrame, PushStream};

    struct FixedSource(u64, AtomicU64);

    #[async_trait]
    impl UnreadCountSource for FixedSource {
        async fn unread_count(&self) -> std::result::Result<u64, ApiError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0)
        }
    }

    /// Hands out a single channel-backed stream, then refuses
    struct OneShotConnector {
        rx: Mutex<Option<mpsc::UnboundedReceiver<PushFrame>>>,
    }

    struct ChannelStream(mpsc::UnboundedReceiver<PushFrame>);

    #[async_trait]
    impl PushStream for ChannelStream {
        async fn next_frame(&mut self) -> Option<PushFrame> {
            self.0.recv().await
        }

        async fn close(&mut self) {
            self.0.close();
        }
    }

    #[async_trait]
    impl PushConnector for OneShotConnector {
        async fn connect(
            &self,
            _url: &str,
        ) -> std::result::Result<Box<dyn PushStream>, TransportError> {
            match self.rx.lock().unwrap().take() {
                Some(rx) => Ok(Box::new(ChannelStream(rx))),
                None => Err(TransportError::Connect("refused".to_string())),
            }
        }
    }

    fn push_text(id: &str) -> PushFrame {
        PushFrame::Text(format!(
            r#"{{"type":"new_notification","notification":{{"id":"{id}","type":"race_scheduled","title":"Round 5","message":"Spa next week","created_at":"2024-05-01T18:00:00Z"}}}}"#
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_wires_badge_toasts_and_poller() {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(OneShotConnector {
            rx: Mutex::new(Some(rx)),
        });
        let source = Arc::new(FixedSource(3, AtomicU64::new(0)));

        let mut session =
            NotificationSession::with_transport(&Settings::default(), "tok", connector, source.clone())
                .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.connection_state(), ConnectionState::Open);
        assert_eq!(session.unread().get(), 3);

        tx.send(push_text("n1")).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.unread().get(), 4);
        assert_eq!(session.toasts().visible().len(), 1);

        // Toast auto-dismisses after 5 seconds
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(session.toasts().is_empty());

        // Next poll resets the pushed increment
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(session.unread().get(), 3);
        assert_eq!(source.1.load(Ordering::SeqCst), 2);

        session.dispose();
        assert!(!session.is_active());
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.client().subscriber_count(), 0);

        // Dispose is idempotent and polling has stopped
        session.dispose();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.1.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_survives_push_outage() {
        let connector = Arc::new(OneShotConnector {
            rx: Mutex::new(None),
        });
        let source = Arc::new(FixedSource(9, AtomicU64::new(0)));

        let session =
            NotificationSession::with_transport(&Settings::default(), "tok", connector, source)
                .unwrap();

        // Push never connects: reconnects exhaust, polling keeps the count
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(!session.client().has_pending_reconnect());
        assert_eq!(session.unread().get(), 9);
        assert_eq!(session.unread().badge_label().as_deref(), Some("9"));
    }
}
