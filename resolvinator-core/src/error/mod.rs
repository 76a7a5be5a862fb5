//! Error types and handling framework.
//!
//! The client distinguishes four failure classes:
//! - `NetworkError` - transport failures; they drive the reconnection state machine
//! - `ProtocolError` - inbound frames that are malformed, oversized or over the rate limit
//! - `ConfigError` - configuration loading and validation
//!
//! Authentication and domain-validation failures on inbound frames are expressed
//! as `ProtocolError` variants as well. None of these terminate the client.
//!
//! ```
//! use resolvinator_core::error::{NetworkError, ResolvinatorError};
//!
//! let error: ResolvinatorError = NetworkError::Timeout { timeout_ms: 5000 }.into();
//! assert!(error.is_recoverable());
//! assert_eq!(error.category(), "network");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error severity levels for categorizing errors.
///
/// - `Fatal`: the operation cannot succeed without operator action
/// - `Recoverable`: the operation failed but can be retried
/// - `Warning`: the offending input was dropped, nothing else is affected
/// - `Info`: an expected condition worth noting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable without operator action.
    Fatal,

    /// Can be recovered from through retry or reconnection.
    #[default]
    Recoverable,

    /// Non-critical issue that is logged and otherwise ignored.
    Warning,

    /// Informational, not a true error.
    Info,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod config;
mod network;
mod protocol;

pub use config::ConfigError;
pub use network::NetworkError;
pub use protocol::ProtocolError;

/// Top-level error type for the Resolvinator client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvinatorError {
    /// Transport-level error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// Inbound frame rejected at the protocol boundary.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl ResolvinatorError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(e) => e.severity(),
            Self::Protocol(e) => e.severity(),
            Self::Config(e) => e.severity(),
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.severity().is_recoverable()
    }

    /// Returns the error category as a string.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Protocol(_) => "protocol",
            Self::Config(_) => "config",
        }
    }
}
