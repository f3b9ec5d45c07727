//! Parser module for price stream frames
//!
//! Handles deserialization of inbound server frames and encoding of the
//! client's subscription frames. Every frame is a JSON text object carrying a
//! `type` discriminator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PriceStreamError, Result};
use crate::prices::{normalize_symbol, PriceSnapshot};

/// Raw price record as carried by a `price_update` frame
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    /// Asset ticker, any case
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Percentage change over the trailing 24h
    pub change_24h: Decimal,

    /// Traded volume over the trailing 24h
    pub volume_24h: Decimal,

    /// Market capitalisation, when the feed knows it
    #[serde(default)]
    pub market_cap: Option<Decimal>,

    /// Server-side timestamp (milliseconds). Informational only.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl PriceRecord {
    /// Normalize and validate the record into a cache snapshot
    pub fn into_snapshot(self, observed_at: DateTime<Utc>) -> Result<PriceSnapshot> {
        let symbol = normalize_symbol(&self.symbol)
            .ok_or_else(|| PriceStreamError::InvalidRecord("empty symbol".to_string()))?;

        if self.price < Decimal::ZERO {
            return Err(PriceStreamError::InvalidRecord(format!(
                "{symbol}: negative price {}",
                self.price
            )));
        }
        if self.volume_24h < Decimal::ZERO {
            return Err(PriceStreamError::InvalidRecord(format!(
                "{symbol}: negative volume {}",
                self.volume_24h
            )));
        }
        if let Some(cap) = self.market_cap.filter(|cap| *cap < Decimal::ZERO) {
            return Err(PriceStreamError::InvalidRecord(format!(
                "{symbol}: negative market cap {cap}"
            )));
        }

        Ok(PriceSnapshot {
            symbol,
            price: self.price,
            change_24h: self.change_24h,
            volume_24h: self.volume_24h,
            market_cap: self.market_cap,
            observed_at,
        })
    }
}

/// Frames sent by the price server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PriceUpdate {
        data: Vec<PriceRecord>,
    },
    Connection {
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Full replacement set of symbols to stream
    Subscribe { symbols: Vec<String> },
    /// Drop all server-side interest for this connection
    Unsubscribe,
}

impl ClientMessage {
    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
