use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::notification::NotificationEvent;

/// Callback invoked for each received notification
pub type NotificationHandler = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to remove that registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Observer list of notification handlers.
///
/// Ids increase monotonically, so iteration order is registration order.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    handlers: RwLock<BTreeMap<SubscriptionId, NotificationHandler>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(handler));
        id
    }

    /// Remove exactly one registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered handler once, returning how many completed.
    ///
    /// Handlers run on a snapshot taken outside the lock, so a handler may
    /// subscribe or unsubscribe without deadlocking. A panicking handler is
    /// logged and skipped; the remaining handlers still run.
    pub fn dispatch(&self, event: &NotificationEvent) -> usize {
        let snapshot: Vec<(SubscriptionId, NotificationHandler)> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut completed = 0;
        for (id, handler) in &snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => completed += 1,
                Err(_) => {
                    tracing::warn!(
                        subscription = id.0,
                        notification_id = %event.id,
                        "Notification handler panicked"
                    );
                }
            }
        }
        completed
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}
