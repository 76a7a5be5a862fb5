//! # Resolvinator Core
//!
//! Shared vocabulary of the Resolvinator channel client.
//!
//! This crate provides:
//! - Identifier newtypes, channel topics and the connection state enum
//! - Typed domain and lifecycle events with a category discriminant
//! - The error taxonomy (network, protocol, configuration)
//! - Collaborator traits for news broadcasting and chat encryption
//! - Configuration loading with YAML/TOML/JSON support and environment overrides

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

/// Identifier newtypes and channel addressing
pub mod types;

/// Events handed to consumers
pub mod events;

/// Error types and handling
pub mod error;

/// Collaborator traits
pub mod traits;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigFormat, ConfigLoader, Configurable, Validatable};
    pub use crate::error::{ConfigError, NetworkError, ProtocolError, ResolvinatorError};
    pub use crate::events::*;
    pub use crate::traits::*;
    pub use crate::types::*;
}
