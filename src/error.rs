//! Error types for the price stream client

use thiserror::Error;

/// Price stream errors
#[derive(Error, Debug)]
pub enum PriceStreamError {
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    #[error("WebSocket message error: {0}")]
    WebSocketMessage(String),

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error("Invalid price record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Connection manager task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for PriceStreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        PriceStreamError::WebSocketConnection(err.to_string())
    }
}

impl From<serde_json::Error> for PriceStreamError {
    fn from(err: serde_json::Error) -> Self {
        PriceStreamError::ParseError(err.to_string())
    }
}

impl From<prometheus::Error> for PriceStreamError {
    fn from(err: prometheus::Error) -> Self {
        PriceStreamError::MetricsError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PriceStreamError>;
