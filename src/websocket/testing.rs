//! In-memory transport for exercising the connection manager

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::transport::{Connector, Transport, TransportEvent};
use crate::error::{PriceStreamError, Result};

/// What the next `connect` call does
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Accept,
    Refuse,
}

/// Server side of one accepted fake connection
///
/// Dropping it ends the client's stream without a close frame.
#[derive(Debug)]
pub(crate) struct FakeLink {
    /// Frames the client sent
    pub sent: mpsc::UnboundedReceiver<String>,
    /// Events to deliver to the client
    pub inbound: mpsc::UnboundedSender<TransportEvent>,
    /// Close codes the client used on this transport
    pub closes: Arc<Mutex<Vec<u16>>>,
}

impl FakeLink {
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.inbound.send(TransportEvent::Text(text.into()));
    }
}

/// One observed `connect` call
#[derive(Debug)]
pub(crate) struct Attempt {
    pub at: Instant,
    pub link: Option<FakeLink>,
}

pub(crate) struct FakeConnector {
    outcomes: Mutex<VecDeque<Outcome>>,
    attempts: mpsc::UnboundedSender<Attempt>,
}

impl FakeConnector {
    /// Scripted outcomes are consumed in order; once they run out every
    /// attempt is accepted.
    pub fn new<I>(outcomes: I) -> (Arc<Self>, mpsc::UnboundedReceiver<Attempt>)
    where
        I: IntoIterator<Item = Outcome>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            attempts: tx,
        });
        (connector, rx)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>> {
        let outcome = self.outcomes.lock().pop_front().unwrap_or(Outcome::Accept);
        let at = Instant::now();

        match outcome {
            Outcome::Refuse => {
                let _ = self.attempts.send(Attempt { at, link: None });
                Err(PriceStreamError::WebSocketConnection(
                    "connection refused".to_string(),
                ))
            }
            Outcome::Accept => {
                let (sent_tx, sent_rx) = mpsc::unbounded_channel();
                let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
                let closes = Arc::new(Mutex::new(Vec::new()));

                let _ = self.attempts.send(Attempt {
                    at,
                    link: Some(FakeLink {
                        sent: sent_rx,
                        inbound: inbound_tx,
                        closes: Arc::clone(&closes),
                    }),
                });

                Ok(Box::new(FakeTransport {
                    sent: sent_tx,
                    inbound: inbound_rx,
                    closes,
                }))
            }
        }
    }
}

struct FakeTransport {
    sent: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    closes: Arc<Mutex<Vec<u16>>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sent
            .send(text)
            .map_err(|_| PriceStreamError::WebSocketMessage("peer gone".to_string()))
    }

    async fn recv(&mut self) -> TransportEvent {
        self.inbound
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed {
                code: None,
                reason: "peer dropped".to_string(),
            })
    }

    async fn close(&mut self, code: u16, _reason: &str) {
        self.closes.lock().push(code);
    }
}
