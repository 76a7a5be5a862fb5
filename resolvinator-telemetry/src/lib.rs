//! # Resolvinator Telemetry
//!
//! Logging for the Resolvinator channel client.
//!
//! This crate provides:
//! - Structured logging with JSON and pretty formats
//! - Stdout and rolling-file outputs
//! - Masking of tokens and secrets in every written log line

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Sensitive data masking
pub mod masking;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, LoggingError, init_logging};
    pub use crate::masking::SensitiveDataMasker;
}
