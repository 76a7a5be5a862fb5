//! Phoenix channel client.
//!
//! Inbound text flows validator → router → topic handler → emitter. The
//! connection state machine owns the transport and the registry and replays
//! the registry whenever a connection opens.
//!
//! - [`ChannelClient`] - public handle; forwards every call to the client task
//! - [`ChannelRegistry`] - durable subscription state and join refs
//! - [`FrameValidator`] - rate window, required fields and payload ceiling
//! - [`MessageRouter`] - dispatch by topic to a [`TopicHandler`]
//! - [`EventEmitter`] / [`EventStream`] - fan-out to consumers

mod client;
mod config;
mod emitter;
mod frame;
mod handlers;
mod machine;
mod registry;
mod router;
mod sanitize;
mod scheduler;
mod validator;

pub use client::{ChannelClient, ChannelClientBuilder};
pub use config::{ChannelConfig, ChannelConfigBuilder};
pub use emitter::{EventEmitter, EventSource, EventStream};
pub use frame::{InboundFrame, OutboundFrame, PHX_ERROR, PHX_JOIN, PHX_LEAVE, PHX_REPLY};
pub use handlers::{
    BroadcastHandler, ProjectHandler, ResourceHandler, SystemHandler, TopicHandler, UserHandler,
};
pub use registry::{ChannelRegistry, SubscriptionSnapshot};
pub use router::MessageRouter;
pub use sanitize::{escape_field, escape_markup};
pub use scheduler::{IntervalScheduler, ReconnectScheduler};
pub use validator::{FrameValidator, RateWindow};
