//! # Resolvinator Gateway
//!
//! Real-time client for the Resolvinator channel server.
//!
//! This crate provides:
//! - A transport abstraction with a tokio-tungstenite WebSocket implementation
//! - A connection state machine with fixed-interval reconnection
//! - Channel subscription tracking that survives reconnects
//! - Inbound validation, routing and typed events
//! - End-to-end encrypted private messaging
//!
//! # Example
//!
//! ```no_run
//! use resolvinator_gateway::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChannelConfig::builder()
//!     .base_url("wss://api.example.com")
//!     .token("t0k3n")
//!     .build();
//!
//! let client = ChannelClient::builder(config).spawn()?;
//! let mut news = client.events().filtered([EventCategory::News]);
//! client.subscribe_all().await?;
//! client.connect().await?;
//!
//! while let Some(event) = news.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

/// Channel client: state machine, registry, validator and router
pub mod channel;

/// Private messaging on top of the channel client
pub mod messaging;

/// Transport abstraction and WebSocket implementation
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::channel::{
        ChannelClient, ChannelClientBuilder, ChannelConfig, ChannelConfigBuilder, EventStream,
        MessageRouter, SubscriptionSnapshot, TopicHandler,
    };
    pub use crate::messaging::MessagingClient;
    pub use crate::transport::{Transport, TransportEvent, WebSocketTransport};
    pub use resolvinator_core::events::{
        ClientEvent, DomainEvent, EventCategory, LifecycleEvent, SystemEventKind,
    };
    pub use resolvinator_core::types::{ChannelTopic, ConnectionState, ProjectId, StreamChannel};
}
