//! Common error types shared by all ports

use std::time::Duration;
use thiserror::Error;

/// Error raised by the activity feed and price ports
///
/// Every variant is recoverable: the caller logs it and skips the cycle
/// (feed) or the single token (price).
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered but expected fields are missing or unreadable
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Caller supplied a value the provider cannot accept (bad pubkey, bad signature)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FetchError {
    /// Returns true for shape problems, as opposed to transport problems
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedResponse(_))
    }

    /// Map a reqwest error, keeping timeouts distinguishable
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Error raised by the notifier port
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Message never reached the channel
    #[error("Delivery failed: {0}")]
    Network(String),

    /// Channel refused the message
    #[error("Rejected by channel (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Notifier is not configured (missing token or destination)
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::HttpStatus { status: 429, body: "slow down".to_string() };
        assert_eq!(err.to_string(), "HTTP 429: slow down");

        let err = FetchError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_is_malformed() {
        assert!(FetchError::MalformedResponse("no pairs".into()).is_malformed());
        assert!(!FetchError::Network("reset".into()).is_malformed());
    }

    #[test]
    fn test_notify_error_display() {
        let err = NotifyError::Rejected { status: 400, body: "chat not found".to_string() };
        assert!(err.to_string().contains("chat not found"));
    }
}
