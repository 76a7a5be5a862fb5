//! Identifier newtypes and channel addressing.
//!
//! - [`ProjectId`] / [`UserId`] - numeric server identifiers
//! - [`ChannelTopic`] - the string key of a joinable stream
//! - [`StreamChannel`] - the three singleton broadcast streams
//! - [`ConnectionState`] - the client's connection state

mod connection_state;
mod ids;
mod topic;

pub use connection_state::ConnectionState;
pub use ids::{ProjectId, UserId};
pub use topic::{ChannelTopic, StreamChannel};

/// Validation error for newtype construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Topic string is empty.
    #[error("topic cannot be empty")]
    EmptyTopic,

    /// Topic contains characters that cannot appear on the wire.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// Identifier is not a non-negative integer.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Name does not refer to one of the singleton streams.
    #[error("unknown stream channel: {0}")]
    UnknownStream(String),
}
