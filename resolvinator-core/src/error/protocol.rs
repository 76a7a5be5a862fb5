//! Inbound frame rejection reasons.
//!
//! A `ProtocolError` always concerns a single frame. The frame is dropped and
//! the reason logged; the connection stays open.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason an inbound frame was rejected before or during routing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolError {
    /// The frame text is not valid JSON.
    #[error("[Protocol] Malformed JSON: {reason}")]
    MalformedJson {
        /// Parser message.
        reason: String,
    },

    /// A required frame field is absent.
    #[error("[Protocol] Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A field is present but has the wrong shape.
    #[error("[Protocol] Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The serialized payload exceeds the size ceiling.
    #[error("[Protocol] Payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Serialized payload size in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        limit: usize,
    },

    /// Too many frames arrived inside the current rate window.
    #[error("[Protocol] Rate limit exceeded: {count} frames in window (max {limit})")]
    RateLimited {
        /// Frames counted in the current window.
        count: u32,
        /// Configured maximum.
        limit: u32,
    },

    /// A user identifier in a payload is not numeric.
    #[error("[Protocol] Invalid user id: {value}")]
    InvalidUserId {
        /// The offending value, rendered as JSON.
        value: String,
    },

    /// The server rejected the client's credentials.
    #[error("[Protocol] Unauthorized")]
    Unauthorized,

    /// A message body could not be encrypted or decrypted.
    #[error("[Protocol] Cipher failure: {reason}")]
    Cipher {
        /// What went wrong.
        reason: String,
    },
}

impl ProtocolError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::Unauthorized => ErrorSeverity::Fatal,
            Self::RateLimited { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Warning,
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSeverity;

    #[test]
    fn test_payload_too_large_display() {
        let error = ProtocolError::PayloadTooLarge {
            size: 2_000_000,
            limit: 1_048_576,
        };
        let text = error.to_string();
        assert!(text.contains("2000000"));
        assert!(text.contains("1048576"));
    }

    #[test]
    fn test_missing_field_helper() {
        let error = ProtocolError::missing_field("topic");
        assert_eq!(
            error,
            ProtocolError::MissingField {
                field: "topic".to_string()
            }
        );
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_unauthorized_severity() {
        assert_eq!(ProtocolError::Unauthorized.severity(), ErrorSeverity::Fatal);
    }
}
