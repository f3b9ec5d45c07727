//! Configuration module for the price stream client

use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::error::{PriceStreamError, Result};
use crate::websocket::{PageLocation, ReconnectPolicy, DEFAULT_STREAM_PATH, MAX_RETRY_DELAY};

/// Longest accepted idle timeout (one day)
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Symbols to stream from the first connection on (e.g., ["BTC", "ETH"])
    pub symbols: Vec<String>,

    /// Streaming endpoint (ws:// or wss://)
    pub ws_url: String,

    /// Reconnection settings
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,

    /// Treat a silent connection as dead after this long; 0 disables
    pub idle_timeout_secs: u64,

    /// Capacity of the per-update broadcast channel
    pub update_buffer: usize,

    /// Port of the health/metrics HTTP server
    pub health_port: u16,

    /// Status logging interval in seconds
    pub status_log_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let symbols = parse_symbols(&env::var("SYMBOLS").unwrap_or_else(|_| "BTC,ETH".to_string()));

        let ws_url = match env::var("WS_URL") {
            Ok(url) => url,
            Err(_) => {
                let origin =
                    env::var("PAGE_ORIGIN").unwrap_or_else(|_| "http://localhost:5000".to_string());
                let path = env::var("WS_PATH").unwrap_or_else(|_| DEFAULT_STREAM_PATH.to_string());
                PageLocation::parse(&origin)?.stream_url(&path)
            }
        };

        let config = Self {
            symbols,
            ws_url,
            reconnect_delay_ms: env::var("RECONNECT_DELAY_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            max_reconnect_attempts: env::var("MAX_RECONNECT_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            idle_timeout_secs: env::var("IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            update_buffer: env::var("UPDATE_BUFFER")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(1024),
            health_port: env::var("HEALTH_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .unwrap_or(9090),
            status_log_interval_secs: env::var("STATUS_LOG_INTERVAL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = self.ws_url.to_ascii_lowercase();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(PriceStreamError::ConfigError(format!(
                "Stream URL must use ws:// or wss://: {}",
                self.ws_url
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(PriceStreamError::ConfigError(
                "Reconnect delay must be positive".to_string(),
            ));
        }
        if u128::from(self.reconnect_delay_ms) > MAX_RETRY_DELAY.as_millis() {
            return Err(PriceStreamError::ConfigError(format!(
                "Reconnect delay must not exceed {}ms",
                MAX_RETRY_DELAY.as_millis()
            )));
        }
        if self.idle_timeout_secs > MAX_IDLE_TIMEOUT_SECS {
            return Err(PriceStreamError::ConfigError(format!(
                "Idle timeout must not exceed {MAX_IDLE_TIMEOUT_SECS}s"
            )));
        }
        if self.update_buffer == 0 {
            return Err(PriceStreamError::ConfigError(
                "Update buffer must hold at least one update".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_delay_ms),
            self.max_reconnect_attempts,
        )
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC".to_string(), "ETH".to_string()],
            ws_url: "ws://localhost:5000/ws".to_string(),
            reconnect_delay_ms: 1000,
            max_reconnect_attempts: 5,
            idle_timeout_secs: 0,
            update_buffer: 1024,
            health_port: 9090,
            status_log_interval_secs: 30,
        }
    }
}

/// Split a comma separated symbol list, dropping blanks
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
