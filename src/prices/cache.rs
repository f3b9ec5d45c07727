//! Last-value price cache
//!
//! Single source of truth for "current price" queries. Entries are keyed by
//! uppercase symbol and replaced wholesale on every update (last write wins,
//! by arrival order).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use super::{normalize_symbol, PriceSnapshot};

/// Keyed store of the latest snapshot per symbol
#[derive(Debug, Default)]
pub struct PriceCache {
    prices: HashMap<String, PriceSnapshot>,
    last_update: Option<DateTime<Utc>>,
}

impl PriceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a snapshot, replacing any previous one for the same symbol
    ///
    /// Returns false when the snapshot carries a blank symbol.
    pub fn apply_update(&mut self, mut snapshot: PriceSnapshot) -> bool {
        let Some(key) = normalize_symbol(&snapshot.symbol) else {
            return false;
        };
        snapshot.symbol = key.clone();
        self.last_update = Some(snapshot.observed_at);
        self.prices.insert(key, snapshot);
        true
    }

    /// Case-insensitive lookup
    pub fn get(&self, symbol: &str) -> Option<&PriceSnapshot> {
        let key = normalize_symbol(symbol)?;
        self.prices.get(&key)
    }

    /// Point-in-time copy of every snapshot, in no particular order
    pub fn get_all(&self) -> Vec<PriceSnapshot> {
        self.prices.values().cloned().collect()
    }

    /// Time of the most recent applied update
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.prices.clear();
        self.last_update = None;
    }
}

/// Cloneable read-only view over a shared cache
///
/// Every accessor returns copies; the lock is released before returning.
#[derive(Debug, Clone)]
pub struct PriceReader {
    cache: Arc<RwLock<PriceCache>>,
}

impl PriceReader {
    pub fn new(cache: Arc<RwLock<PriceCache>>) -> Self {
        Self { cache }
    }

    pub fn price_data(&self, symbol: &str) -> Option<PriceSnapshot> {
        self.cache.read().get(symbol).cloned()
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.cache.read().get(symbol).map(|snapshot| snapshot.price)
    }

    pub fn change_24h(&self, symbol: &str) -> Option<Decimal> {
        self.cache.read().get(symbol).map(|snapshot| snapshot.change_24h)
    }

    pub fn all_prices(&self) -> Vec<PriceSnapshot> {
        self.cache.read().get_all()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.cache.read().last_update()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
