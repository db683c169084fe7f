// Shared components
pub mod config;
pub mod error;
pub mod metrics;

// Domain
pub mod notification;

// Transport and delivery
pub mod api;
pub mod client;
pub mod websocket;

// Consumers and lifecycle
pub mod consumers;
pub mod session;
pub mod tasks;

pub use client::{ConnectionState, NotificationClient, SubscriptionId};
pub use config::Settings;
pub use error::{ClientError, Result};
pub use notification::NotificationEvent;
pub use session::NotificationSession;
