//! WebSocket transport backed by tokio-tungstenite
//!
//! Handles connection, frame reception, and keepalive replies.

use std::borrow::Cow;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::{frame::coding::CloseCode, CloseFrame, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use super::transport::{Connector, Transport, TransportEvent};
use crate::error::{PriceStreamError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens real WebSocket connections
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        info!(url = %url, "Connecting to price stream");

        let (stream, response) = connect_async(url).await.map_err(|e| {
            PriceStreamError::WebSocketConnection(format!("Failed to connect: {}", e))
        })?;

        info!(status = ?response.status(), "WebSocket connected");
        Ok(Box::new(WsTransport { stream }))
    }
}

/// A single open WebSocket connection
pub struct WsTransport {
    stream: WsStream,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| PriceStreamError::WebSocketMessage(e.to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    debug!(len = text.len(), "Received text message");
                    return TransportEvent::Text(text);
                }
                Some(Ok(Message::Binary(data))) => {
                    return TransportEvent::Text(String::from_utf8_lossy(&data).into_owned());
                }
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received ping, sending pong");
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        warn!(error = %e, "Failed to answer ping");
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    debug!("Received pong");
                }
                Some(Ok(Message::Close(frame))) => {
                    warn!(frame = ?frame, "Received close frame");
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (None, String::from("close frame without status")),
                    };
                    return TransportEvent::Closed { code, reason };
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    return TransportEvent::Error(e.to_string());
                }
                None => {
                    warn!("WebSocket stream ended");
                    return TransportEvent::Closed {
                        code: None,
                        reason: String::from("stream ended"),
                    };
                }
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        if let Err(e) = self.stream.close(Some(frame)).await {
            debug!(error = %e, "Close handshake did not complete");
        }
    }
}
