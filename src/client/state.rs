use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Push connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConnectionState {
    /// No transport and no reconnect pending
    Disconnected = 0,
    /// First transport of an explicit connect is being established
    Connecting = 1,
    /// Transport is open and receiving frames
    Open = 2,
    /// Transport was lost; a reconnect is pending or in progress
    Reconnecting = 3,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running counters for a client
#[derive(Debug, Default)]
pub(crate) struct ClientCounters {
    pub connect_attempts: AtomicU64,
    pub reconnects_scheduled: AtomicU64,
    pub notifications_received: AtomicU64,
    pub messages_discarded: AtomicU64,
}

impl ClientCounters {
    pub fn snapshot(&self, state: ConnectionState, reconnect_attempt: u32) -> ClientStats {
        ClientStats {
            state,
            reconnect_attempt,
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            reconnects_scheduled: self.reconnects_scheduled.load(Ordering::Relaxed),
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            messages_discarded: self.messages_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of client statistics
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub state: ConnectionState,
    /// Reconnect delays used since the last explicit connect
    pub reconnect_attempt: u32,
    pub connect_attempts: u64,
    pub reconnects_scheduled: u64,
    pub notifications_received: u64,
    pub messages_discarded: u64,
}
