//! Stream URL derivation from the hosting page's origin

use crate::error::{PriceStreamError, Result};

/// Path of the streaming endpoint on the host
pub const DEFAULT_STREAM_PATH: &str = "/ws";

/// Scheme and authority of the page that hosts the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    secure: bool,
    host: String,
}

impl PageLocation {
    /// Parse an origin such as `https://app.example.com:8443`
    pub fn parse(origin: &str) -> Result<Self> {
        let origin = origin.trim();
        let lower = origin.to_ascii_lowercase();

        let (secure, rest) = if lower.starts_with("https://") {
            (true, &origin["https://".len()..])
        } else if lower.starts_with("http://") {
            (false, &origin["http://".len()..])
        } else {
            return Err(PriceStreamError::ConfigError(format!(
                "Page origin must start with http:// or https://: {origin}"
            )));
        };

        let host = rest
            .split(|c| matches!(c, '/' | '?' | '#'))
            .next()
            .unwrap_or_default();
        if host.is_empty() {
            return Err(PriceStreamError::ConfigError(format!(
                "Page origin has no host: {origin}"
            )));
        }

        Ok(Self {
            secure,
            host: host.to_string(),
        })
    }

    /// Secure pages stream over `wss`, plain pages over `ws`
    pub fn stream_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        if path.starts_with('/') {
            format!("{scheme}://{}{path}", self.host)
        } else {
            format!("{scheme}://{}/{path}", self.host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_page_uses_wss() {
        let location = PageLocation::parse("https://pro.example.com").unwrap();
        assert_eq!(location.stream_url(DEFAULT_STREAM_PATH), "wss://pro.example.com/ws");
    }

    #[test]
    fn test_plain_page_keeps_host_and_port() {
        let location = PageLocation::parse("http://localhost:5000/dashboard?tab=1").unwrap();
        assert_eq!(location.stream_url("ws"), "ws://localhost:5000/ws");
    }

    #[test]
    fn test_rejects_unknown_scheme_and_missing_host() {
        assert!(PageLocation::parse("ftp://example.com").is_err());
        assert!(PageLocation::parse("https://").is_err());
        assert!(PageLocation::parse("localhost:5000").is_err());
    }
}
