use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::notification::NotificationEvent;

/// Popup shown for a notification received in real time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: String,
    pub title: String,
    pub message: String,
}

impl From<&NotificationEvent> for Toast {
    fn from(event: &NotificationEvent) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            message: event.message.clone(),
        }
    }
}

/// Visible toasts, each dismissed automatically after a fixed delay
#[derive(Debug, Clone)]
pub struct ToastQueue {
    inner: Arc<ToastInner>,
}

#[derive(Debug)]
struct ToastInner {
    dismiss_after: Duration,
    toasts: Mutex<Vec<Toast>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl ToastQueue {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            inner: Arc::new(ToastInner {
                dismiss_after,
                toasts: Mutex::new(Vec::new()),
                timers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Show a toast for `event` and arm its auto-dismiss timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn push(&self, event: &NotificationEvent) {
        let toast = Toast::from(event);
        let id = toast.id.clone();
        lock(&self.inner.toasts).push(toast);

        let queue = self.clone();
        let delay = self.inner.dismiss_after;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.dismiss(&id);
        });

        let mut timers = lock(&self.inner.timers);
        timers.retain(|t| !t.is_finished());
        timers.push(timer);
    }

    /// Remove every toast with this id
    pub fn dismiss(&self, id: &str) {
        lock(&self.inner.toasts).retain(|t| t.id != id);
    }

    pub fn visible(&self) -> Vec<Toast> {
        lock(&self.inner.toasts).clone()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner.toasts).is_empty()
    }

    /// Cancel pending timers and drop every visible toast
    pub fn clear(&self) {
        for timer in lock(&self.inner.timers).drain(..) {
            timer.abort();
        }
        lock(&self.inner.toasts).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationType;

    fn event(id: &str) -> NotificationEvent {
        NotificationEvent::new(id, NotificationType::ResultPublished, "Results", "Round 4 is final")
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_auto_dismisses() {
        let queue = ToastQueue::new(Duration::from_secs(5));
        queue.push(&event("n1"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        queue.push(&event("n2"));
        assert_eq!(queue.visible().len(), 2);

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        let visible = queue.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "n2");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_manual_dismiss() {
        let queue = ToastQueue::new(Duration::from_secs(60));
        queue.push(&event("n1"));
        queue.push(&event("n2"));

        queue.dismiss("n1");
        let visible = queue.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Results");

        queue.clear();
        assert!(queue.is_empty());
    }
}
