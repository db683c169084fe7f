//! Prometheus metrics for the notification client.
//!
//! - Push connection metrics (state, attempts, opens/closes, reconnects)
//! - Message metrics (notifications received, frames discarded)
//! - Polling and REST metrics

mod helpers;

pub use helpers::{encode_metrics, ApiMetrics, MessageMetrics, PollMetrics, PushMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "league_client";

lazy_static! {
    // ============================================================================
    // Push Connection Metrics
    // ============================================================================

    /// Current push connection state (0=disconnected, 1=connecting, 2=open, 3=reconnecting)
    pub static ref PUSH_CONNECTION_STATE: IntGauge = register_int_gauge!(
        format!("{}_push_connection_state", METRIC_PREFIX),
        "Push connection state (0=disconnected, 1=connecting, 2=open, 3=reconnecting)"
    ).unwrap();

    /// Total push connection attempts
    pub static ref PUSH_CONNECT_ATTEMPTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_connect_attempts_total", METRIC_PREFIX),
        "Total push connection attempts"
    ).unwrap();

    /// Total failed push connection attempts
    pub static ref PUSH_CONNECT_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_connect_failures_total", METRIC_PREFIX),
        "Total push connection attempts that failed before opening"
    ).unwrap();

    /// Total push connections opened
    pub static ref PUSH_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_push_connections_opened_total", METRIC_PREFIX),
        "Total push connections opened"
    ).unwrap();

    /// Total push connections closed by the server or by a transport error
    pub static ref PUSH_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_push_connections_closed_total", METRIC_PREFIX),
        "Total push connections lost"
    ).unwrap();

    /// Total reconnects scheduled
    pub static ref PUSH_RECONNECTS_SCHEDULED: IntCounter = register_int_counter!(
        format!("{}_push_reconnects_scheduled_total", METRIC_PREFIX),
        "Total reconnect attempts scheduled"
    ).unwrap();

    /// Times the reconnect budget ran out
    pub static ref PUSH_RECONNECTS_EXHAUSTED: IntCounter = register_int_counter!(
        format!("{}_push_reconnects_exhausted_total", METRIC_PREFIX),
        "Times automatic reconnection gave up"
    ).unwrap();

    // ============================================================================
    // Message Metrics
    // ============================================================================

    /// Notifications received over the push channel
    pub static ref NOTIFICATIONS_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_notifications_received_total", METRIC_PREFIX),
        "Total notifications received over the push channel"
    ).unwrap();

    /// Push frames that did not match the notification shape
    pub static ref PUSH_MESSAGES_DISCARDED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_push_messages_discarded_total", METRIC_PREFIX),
        "Total push frames discarded as malformed or unknown"
    ).unwrap();

    // ============================================================================
    // Polling & REST Metrics
    // ============================================================================

    /// Unread-count polls by result
    pub static ref UNREAD_POLLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_unread_polls_total", METRIC_PREFIX),
        "Total unread-count polls",
        &["result"]
    ).unwrap();

    /// Last known unread count
    pub static ref UNREAD_COUNT: IntGauge = register_int_gauge!(
        format!("{}_unread_count", METRIC_PREFIX),
        "Last known unread notification count"
    ).unwrap();

    /// REST requests by endpoint and result
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_api_requests_total", METRIC_PREFIX),
        "Total REST requests",
        &["endpoint", "result"]
    ).unwrap();
}
