//! Inbound frame dispatch
//!
//! Decodes text frames and routes them either into the price cache or back to
//! the connection manager as a control signal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::metrics::StreamMetrics;
use crate::parser::{PriceRecord, ServerMessage};
use crate::prices::{PriceCache, PriceSnapshot};

/// Connection-level meaning of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Application-level confirmation that the stream is live
    Acknowledged,
    /// Server reported an error; treat the stream as down
    ServerError(String),
}

/// Routes decoded frames to the cache and update subscribers
pub struct Dispatcher {
    cache: Arc<RwLock<PriceCache>>,
    updates: broadcast::Sender<PriceSnapshot>,
    metrics: Arc<StreamMetrics>,
}

impl Dispatcher {
    pub fn new(
        cache: Arc<RwLock<PriceCache>>,
        updates: broadcast::Sender<PriceSnapshot>,
        metrics: Arc<StreamMetrics>,
    ) -> Self {
        Self {
            cache,
            updates,
            metrics,
        }
    }

    /// Handle one inbound text frame
    ///
    /// Malformed frames are logged and dropped; they never produce a signal.
    pub fn handle_frame(&self, raw: &str, received_at: DateTime<Utc>) -> Option<ControlSignal> {
        self.metrics.frames_received.inc();

        let message = match ServerMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                self.metrics.frames_malformed.inc();
                warn!(error = %e, len = raw.len(), "Dropping malformed frame");
                return None;
            }
        };

        match message {
            ServerMessage::PriceUpdate { data } => {
                self.apply_prices(data, received_at);
                None
            }
            ServerMessage::Connection { message } => {
                debug!(message = ?message, "Server acknowledged connection");
                Some(ControlSignal::Acknowledged)
            }
            ServerMessage::Error { message } => {
                let message = message.unwrap_or_else(|| "unspecified server error".to_string());
                warn!(message = %message, "Server reported an error");
                Some(ControlSignal::ServerError(message))
            }
            ServerMessage::Unknown => {
                trace!(frame = %raw, "Ignoring unknown message type");
                None
            }
        }
    }

    /// Drop every cached price
    pub fn clear(&self) {
        self.cache.write().clear();
        self.metrics.tracked_symbols.set(0);
    }

    fn apply_prices(&self, records: Vec<PriceRecord>, received_at: DateTime<Utc>) {
        let snapshots: Vec<PriceSnapshot> = records
            .into_iter()
            .filter_map(|record| match record.into_snapshot(received_at) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(error = %e, "Skipping price record");
                    None
                }
            })
            .collect();

        if snapshots.is_empty() {
            return;
        }

        {
            let mut cache = self.cache.write();
            for snapshot in &snapshots {
                cache.apply_update(snapshot.clone());
            }
            self.metrics.tracked_symbols.set(cache.len() as i64);
        }

        for snapshot in snapshots {
            trace!(
                symbol = %snapshot.symbol,
                price = %snapshot.price,
                change_24h = %snapshot.change_24h,
                "Price updated"
            );
            self.metrics.price_updates.inc();
            // No receivers is fine; the cache already holds the value.
            let _ = self.updates.send(snapshot);
        }
    }
}
