use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::api::UnreadCountSource;
use crate::consumers::UnreadCounter;
use crate::metrics::PollMetrics;

/// Shortest interval the poller will run at
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that keeps the unread count eventually correct by
/// polling the REST endpoint, independent of the push channel.
pub struct UnreadCountPoller {
    interval: Duration,
    source: Arc<dyn UnreadCountSource>,
    counter: UnreadCounter,
    shutdown: broadcast::Receiver<()>,
}

impl UnreadCountPoller {
    pub fn new(
        interval: Duration,
        source: Arc<dyn UnreadCountSource>,
        counter: UnreadCounter,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Unread poll interval too short, using 1s"
            );
        }

        Self {
            interval: interval.max(MIN_INTERVAL),
            source,
            counter,
            shutdown,
        }
    }

    /// Poll immediately, then once per interval until shutdown
    pub async fn run(mut self) {
        let mut poll_timer = tokio::time::interval(self.interval);
        poll_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Unread count poller started"
        );

        loop {
            tokio::select! {
                // A closed sender also means stop
                _ = self.shutdown.recv() => {
                    tracing::debug!("Unread count poller received shutdown signal");
                    break;
                }
                _ = poll_timer.tick() => {
                    self.poll_once().await;
                }
            }
        }

        tracing::info!("Unread count poller stopped");
    }

    async fn poll_once(&self) {
        match self.source.unread_count().await {
            Ok(count) => {
                let previous = self.counter.get();
                self.counter.reset(count);
                PollMetrics::record_success(count);
                if previous != count {
                    tracing::debug!(previous = previous, unread = count, "Unread count updated");
                }
            }
            Err(e) => {
                PollMetrics::record_failure();
                tracing::warn!(error = %e, "Failed to poll unread count");
            }
        }
    }
}
