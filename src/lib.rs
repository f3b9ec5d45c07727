//! Pro Price Stream - Real-Time Price Client Library
//!
//! This crate keeps a resilient WebSocket subscription to a price streaming
//! endpoint: it reconnects with exponential backoff, replays subscriptions
//! after every reconnect, and exposes the latest price per symbol together
//! with an observable connection status.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod prices;
pub mod websocket;

pub use client::PriceStreamClient;
pub use config::Config;
pub use error::{PriceStreamError, Result};
pub use metrics::StreamMetrics;
pub use parser::{ClientMessage, PriceRecord, ServerMessage};
pub use prices::{PriceCache, PriceReader, PriceSnapshot};
pub use websocket::{
    ConnectionState, Connector, ReconnectPolicy, StreamStatus, SubscriptionSet, Transport,
    TransportEvent, WsConnector,
};
