//! Price module
//!
//! Keeps the latest known price snapshot per symbol, fed by the dispatcher.

mod cache;

pub use cache::{PriceCache, PriceReader};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest known market state for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    /// Uppercase ticker, unique key in the cache
    pub symbol: String,
    pub price: Decimal,
    /// Signed percentage change over the trailing 24h
    pub change_24h: Decimal,
    pub volume_24h: Decimal,
    pub market_cap: Option<Decimal>,
    /// When the client received the snapshot (not exchange time)
    pub observed_at: DateTime<Utc>,
}

/// Normalize a ticker for use as a cache or subscription key.
///
/// Returns `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
