//! Connection state published to observers

use serde::{Deserialize, Serialize};

/// Transport status as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Never connected
    Idle,
    Connecting,
    Open,
    /// Closed on purpose, by the caller or with a normal closure from the peer
    ClosedClean,
    /// Abnormal close, transport error, or an application-level error frame
    ClosedError,
    ReconnectScheduled,
    /// Automatic retries used up; only an explicit `connect()` tries again
    ReconnectExhausted,
}

/// Snapshot of the connection published on every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub state: ConnectionState,
    /// Retries scheduled since the last successful open
    pub attempt: u32,
    /// Delay of the pending reconnect, while one is scheduled
    pub retry_delay_ms: Option<u64>,
    /// The server sent its `connection` frame on the current transport
    pub acknowledged: bool,
    /// Last connection error, cleared on a successful open
    pub error: Option<String>,
}

impl StreamStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::ReconnectScheduled
        )
    }
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Idle,
            attempt: 0,
            retry_delay_ms: None,
            acknowledged: false,
            error: None,
        }
    }
}
