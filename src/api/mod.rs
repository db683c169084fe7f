//! REST client for the notification endpoints.

mod notifications;

pub use notifications::{NotificationsApi, UnreadCountSource};
