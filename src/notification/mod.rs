//! Notification types shared by the push channel and the REST endpoints.

mod types;

pub use types::{
    MarkAllReadResponse, Notification, NotificationEvent, NotificationFilter,
    NotificationListItem, NotificationType, ReadFilter, UnreadCount,
};
