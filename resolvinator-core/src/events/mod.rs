//! Events emitted by the channel client.

mod chat;
mod domain;
mod system;

pub use chat::ChatMessage;
pub use domain::{ClientEvent, DomainEvent, EventCategory, LifecycleEvent};
pub use system::{EventPriority, SystemEventKind};
