//! Transport seam between the connection manager and the network

use async_trait::async_trait;

use crate::error::Result;

/// WebSocket "normal closure" close code
pub const NORMAL_CLOSURE: u16 = 1000;

/// Something the transport observed on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One decoded text frame
    Text(String),
    /// The peer closed the connection. `code` is `None` when the stream ended
    /// without a close frame.
    Closed { code: Option<u16>, reason: String },
    /// Socket-level failure; the transport is unusable afterwards
    Error(String),
}

impl TransportEvent {
    /// True for a close carrying the normal closure code
    pub fn is_clean_close(&self) -> bool {
        matches!(self, TransportEvent::Closed { code: Some(NORMAL_CLOSURE), .. })
    }
}

/// One open, write-ready connection
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Wait for the next meaningful event. Keepalive traffic is handled
    /// internally and never surfaces here.
    async fn recv(&mut self) -> TransportEvent;

    /// Close with the given code. Errors are swallowed; the transport is
    /// discarded afterwards either way.
    async fn close(&mut self, code: u16, reason: &str);
}

/// Opens transports
///
/// `connect` resolves only once the handshake has completed, so the returned
/// transport is ready for writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>>;
}
