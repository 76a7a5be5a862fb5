//! Network-related error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport error type covering connection failures, timeouts and WebSocket errors.
///
/// # Examples
///
/// ```
/// use resolvinator_core::error::NetworkError;
///
/// let error = NetworkError::ConnectionFailed {
///     reason: "Connection refused".to_string(),
/// };
/// assert!(error.to_string().contains("Connection refused"));
/// assert!(error.is_recoverable());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkError {
    /// Connection to the server failed.
    #[error("[Network] Connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for the connection failure.
        reason: String,
    },

    /// Connection attempt timed out.
    #[error("[Network] Connection timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// WebSocket protocol error.
    #[error("[Network] WebSocket error: {reason}")]
    WebSocket {
        /// Reason for the WebSocket error.
        reason: String,
    },

    /// Connection was closed.
    #[error("[Network] Connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the connection closure.
        reason: String,
    },

    /// The connection URL could not be built or parsed.
    #[error("[Network] Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL, with credentials already redacted.
        url: String,
        /// Parse failure.
        reason: String,
    },

    /// The client task is no longer running.
    #[error("[Network] Client is not running")]
    NotRunning,
}

impl NetworkError {
    /// Returns true if this error can be retried.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionFailed { .. }
                | Self::ConnectionClosed { .. }
                | Self::WebSocket { .. }
        )
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::InvalidUrl { .. } | Self::NotRunning => ErrorSeverity::Fatal,
            Self::Timeout { .. }
            | Self::ConnectionFailed { .. }
            | Self::ConnectionClosed { .. }
            | Self::WebSocket { .. } => ErrorSeverity::Recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    #[test]
    fn test_timeout() {
        let error = NetworkError::Timeout { timeout_ms: 5000 };
        assert!(error.to_string().contains("5000ms"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let error = NetworkError::InvalidUrl {
            url: "wss://".to_string(),
            reason: "empty host".to_string(),
        };
        assert!(!error.is_recoverable());
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_not_running() {
        let error = NetworkError::NotRunning;
        assert!(error.to_string().contains("not running"));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_serde_roundtrip() {
        let error = NetworkError::WebSocket {
            reason: "reset by peer".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        let parsed: NetworkError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, parsed);
    }
}
