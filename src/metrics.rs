//! Stream metrics
//!
//! Prometheus counters owned by one client instance.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::{PriceStreamError, Result};

/// Counters shared by the connection manager and the dispatcher
#[derive(Debug, Clone)]
pub struct StreamMetrics {
    registry: Registry,

    /// Text frames received from the server
    pub frames_received: IntCounter,

    /// Frames dropped because they failed to decode
    pub frames_malformed: IntCounter,

    /// Snapshots applied to the cache
    pub price_updates: IntCounter,

    /// Transport open attempts, initial and retries
    pub connect_attempts: IntCounter,

    pub reconnects_scheduled: IntCounter,

    /// Symbols currently held in the cache
    pub tracked_symbols: IntGauge,
}

impl StreamMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let frames_received =
            IntCounter::new("price_stream_frames_received_total", "Text frames received")?;
        let frames_malformed = IntCounter::new(
            "price_stream_frames_malformed_total",
            "Frames dropped because they failed to decode",
        )?;
        let price_updates = IntCounter::new(
            "price_stream_price_updates_total",
            "Price snapshots applied to the cache",
        )?;
        let connect_attempts = IntCounter::new(
            "price_stream_connect_attempts_total",
            "Transport connection attempts",
        )?;
        let reconnects_scheduled = IntCounter::new(
            "price_stream_reconnects_scheduled_total",
            "Reconnect attempts scheduled after a failure",
        )?;
        let tracked_symbols =
            IntGauge::new("price_stream_tracked_symbols", "Symbols held in the price cache")?;

        registry.register(Box::new(frames_received.clone()))?;
        registry.register(Box::new(frames_malformed.clone()))?;
        registry.register(Box::new(price_updates.clone()))?;
        registry.register(Box::new(connect_attempts.clone()))?;
        registry.register(Box::new(reconnects_scheduled.clone()))?;
        registry.register(Box::new(tracked_symbols.clone()))?;

        Ok(Self {
            registry,
            frames_received,
            frames_malformed,
            price_updates,
            connect_attempts,
            reconnects_scheduled,
            tracked_symbols,
        })
    }

    /// Render in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| PriceStreamError::MetricsError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_counters() {
        let metrics = StreamMetrics::new().unwrap();
        metrics.frames_received.inc_by(3);
        metrics.tracked_symbols.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("price_stream_frames_received_total 3"));
        assert!(text.contains("price_stream_tracked_symbols 2"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = StreamMetrics::new().unwrap();
        let b = StreamMetrics::new().unwrap();
        a.connect_attempts.inc();
        assert_eq!(a.connect_attempts.get(), 1);
        assert_eq!(b.connect_attempts.get(), 0);
    }
}
