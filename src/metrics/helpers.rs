//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    API_REQUESTS_TOTAL, NOTIFICATIONS_RECEIVED_TOTAL, PUSH_CONNECTIONS_CLOSED,
    PUSH_CONNECTIONS_OPENED, PUSH_CONNECTION_STATE, PUSH_CONNECT_ATTEMPTS_TOTAL,
    PUSH_CONNECT_FAILURES_TOTAL, PUSH_MESSAGES_DISCARDED_TOTAL, PUSH_RECONNECTS_EXHAUSTED,
    PUSH_RECONNECTS_SCHEDULED, UNREAD_COUNT, UNREAD_POLLS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording push connection metrics
pub struct PushMetrics;

impl PushMetrics {
    pub fn set_state(value: i64) {
        PUSH_CONNECTION_STATE.set(value);
    }

    pub fn record_attempt() {
        PUSH_CONNECT_ATTEMPTS_TOTAL.inc();
    }

    pub fn record_connect_failure() {
        PUSH_CONNECT_FAILURES_TOTAL.inc();
    }

    pub fn record_opened() {
        PUSH_CONNECTIONS_OPENED.inc();
    }

    pub fn record_closed() {
        PUSH_CONNECTIONS_CLOSED.inc();
    }

    pub fn record_reconnect_scheduled() {
        PUSH_RECONNECTS_SCHEDULED.inc();
    }

    pub fn record_reconnects_exhausted() {
        PUSH_RECONNECTS_EXHAUSTED.inc();
    }
}

/// Helper struct for recording push message metrics
pub struct MessageMetrics;

impl MessageMetrics {
    pub fn record_received() {
        NOTIFICATIONS_RECEIVED_TOTAL.inc();
    }

    pub fn record_discarded() {
        PUSH_MESSAGES_DISCARDED_TOTAL.inc();
    }
}

/// Helper struct for recording unread-count polling metrics
pub struct PollMetrics;

impl PollMetrics {
    pub fn record_success(unread: u64) {
        UNREAD_POLLS_TOTAL.with_label_values(&["success"]).inc();
        UNREAD_COUNT.set(i64::try_from(unread).unwrap_or(i64::MAX));
    }

    pub fn record_failure() {
        UNREAD_POLLS_TOTAL.with_label_values(&["failure"]).inc();
    }
}

/// Helper struct for recording REST request metrics
pub struct ApiMetrics;

impl ApiMetrics {
    pub fn record(endpoint: &str, success: bool) {
        let result = if success { "success" } else { "failure" };
        API_REQUESTS_TOTAL.with_label_values(&[endpoint, result]).inc();
    }
}
