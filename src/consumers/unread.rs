use std::sync::Arc;

use tokio::sync::watch;

/// Largest count the badge shows before switching to "99+"
const BADGE_MAX: u64 = 99;

/// Shared unread-notification count.
///
/// Polls reset the value to the server's count; push events increment it
/// in between.
#[derive(Debug, Clone)]
pub struct UnreadCounter {
    tx: Arc<watch::Sender<u64>>,
}

impl UnreadCounter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Replace the count with an authoritative value
    pub fn reset(&self, count: u64) {
        self.tx.send_replace(count);
    }

    pub fn increment(&self) {
        self.tx.send_modify(|count| *count = count.saturating_add(1));
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn badge_label(&self) -> Option<String> {
        badge_label(self.get())
    }
}

impl Default for UnreadCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Text for the unread badge, or `None` when it should be hidden
pub fn badge_label(count: u64) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{}+", BADGE_MAX)),
        n => Some(n.to_string()),
    }
}
