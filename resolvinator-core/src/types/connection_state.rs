//! Connection state of the channel client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection state of the channel client.
///
/// Exactly one value holds at any time. `Disconnected` is initial; `Error`
/// and `Disconnected` both lead back to `Connecting` through the reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The transport is open.
    Connected,
    /// The transport reported an error.
    Error,
}

impl ConnectionState {
    /// Returns true if the connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true if the client is not connected and not connecting.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::Error.to_string(), "Error");
    }

    #[test]
    fn test_connection_state_checks() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Disconnected.is_inactive());
        assert!(ConnectionState::Error.is_inactive());
        assert!(!ConnectionState::Connecting.is_inactive());
    }

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
