//! Typed events handed to consumers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{EventPriority, SystemEventKind};
use crate::types::{ConnectionState, UserId};

/// Event parsed from a validated inbound frame.
///
/// Constructed once by the router, handed to the emitter and not retained
/// by the client afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A risk was created.
    ResourceCreated {
        /// Risk object as sent by the server.
        resource: Value,
    },
    /// A risk was updated.
    ResourceUpdated {
        /// Risk object as sent by the server.
        resource: Value,
    },
    /// A risk was deleted.
    ResourceDeleted {
        /// Identifier of the deleted risk.
        id: i64,
    },
    /// A mitigation was created.
    MitigationCreated {
        /// Mitigation object.
        mitigation: Value,
    },
    /// A mitigation was updated.
    MitigationUpdated {
        /// Mitigation object.
        mitigation: Value,
    },
    /// A mitigation was deleted.
    MitigationDeleted {
        /// Identifier of the deleted mitigation.
        id: i64,
    },
    /// A task was created.
    TaskCreated {
        /// Task object.
        task: Value,
    },
    /// A task was updated.
    TaskUpdated {
        /// Task object.
        task: Value,
    },
    /// A task was completed.
    TaskCompleted {
        /// Task object.
        task: Value,
    },
    /// A chat message arrived. `content` is already markup-escaped but not decrypted.
    Message {
        /// Message payload.
        payload: Value,
    },
    /// A user came online or went offline.
    PresenceChanged {
        /// The user.
        user_id: UserId,
        /// `true` for join, `false` for leave.
        online: bool,
    },
    /// A recognised system condition.
    SystemEvent {
        /// The condition.
        kind: SystemEventKind,
        /// Accompanying data.
        payload: Value,
    },
    /// Any frame on the system stream, recognised or not.
    SystemStatusUpdated {
        /// Raw payload.
        payload: Value,
    },
    /// A news item for all users.
    NewsBroadcast {
        /// Headline.
        title: String,
        /// Body, markup-escaped.
        message: String,
        /// Priority.
        priority: EventPriority,
    },
}

impl DomainEvent {
    /// Returns the category of this event.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::ResourceCreated { .. }
            | Self::ResourceUpdated { .. }
            | Self::ResourceDeleted { .. } => EventCategory::Resource,
            Self::MitigationCreated { .. }
            | Self::MitigationUpdated { .. }
            | Self::MitigationDeleted { .. } => EventCategory::Mitigation,
            Self::TaskCreated { .. } | Self::TaskUpdated { .. } | Self::TaskCompleted { .. } => {
                EventCategory::Task
            }
            Self::Message { .. } => EventCategory::Message,
            Self::PresenceChanged { .. } => EventCategory::Presence,
            Self::SystemEvent { .. } | Self::SystemStatusUpdated { .. } => EventCategory::System,
            Self::NewsBroadcast { .. } => EventCategory::News,
        }
    }
}

/// Connection lifecycle signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The connection state changed. Never emitted for a transition into the same state.
    StateChanged {
        /// The new state.
        state: ConnectionState,
    },
    /// The transport opened.
    Connected,
    /// The transport closed.
    Disconnected,
    /// The transport reported an error.
    Error {
        /// Description of the error.
        message: String,
    },
    /// The server rejected the client's credentials.
    AuthenticationFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The reconnect budget is spent; only an explicit connect resumes.
    ReconnectExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Anything the client emits to its consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Parsed domain payload.
    Domain(DomainEvent),
    /// Connection lifecycle signal.
    Lifecycle(LifecycleEvent),
}

impl ClientEvent {
    /// Returns the category of this event.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Domain(event) => event.category(),
            Self::Lifecycle(_) => EventCategory::Connection,
        }
    }

    /// Returns the domain event, if this is one.
    #[must_use]
    pub fn as_domain(&self) -> Option<&DomainEvent> {
        match self {
            Self::Domain(event) => Some(event),
            Self::Lifecycle(_) => None,
        }
    }

    /// Returns the lifecycle event, if this is one.
    #[must_use]
    pub fn as_lifecycle(&self) -> Option<&LifecycleEvent> {
        match self {
            Self::Lifecycle(event) => Some(event),
            Self::Domain(_) => None,
        }
    }
}

impl From<DomainEvent> for ClientEvent {
    fn from(event: DomainEvent) -> Self {
        Self::Domain(event)
    }
}

impl From<LifecycleEvent> for ClientEvent {
    fn from(event: LifecycleEvent) -> Self {
        Self::Lifecycle(event)
    }
}

/// Discriminant consumers filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Risk lifecycle.
    Resource,
    /// Mitigation lifecycle.
    Mitigation,
    /// Task lifecycle.
    Task,
    /// Chat messages.
    Message,
    /// User presence.
    Presence,
    /// System conditions and status.
    System,
    /// News broadcasts.
    News,
    /// Connection lifecycle.
    Connection,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resource => "resource",
            Self::Mitigation => "mitigation",
            Self::Task => "task",
            Self::Message => "message",
            Self::Presence => "presence",
            Self::System => "system",
            Self::News => "news",
            Self::Connection => "connection",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_categories() {
        assert_eq!(
            DomainEvent::ResourceDeleted { id: 5 }.category(),
            EventCategory::Resource
        );
        assert_eq!(
            DomainEvent::TaskCompleted { task: json!({}) }.category(),
            EventCategory::Task
        );
        assert_eq!(
            DomainEvent::SystemStatusUpdated { payload: json!({}) }.category(),
            EventCategory::System
        );
        assert_eq!(
            ClientEvent::from(LifecycleEvent::Connected).category(),
            EventCategory::Connection
        );
    }

    #[test]
    fn test_domain_event_json_shape() {
        let event = DomainEvent::PresenceChanged {
            user_id: UserId::new(7),
            online: true,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"type": "presence_changed", "user_id": 7, "online": true})
        );
    }

    #[test]
    fn test_client_event_json_shape() {
        let event = ClientEvent::from(LifecycleEvent::ReconnectExhausted { attempts: 5 });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"kind": "lifecycle", "event": {"type": "reconnect_exhausted", "attempts": 5}})
        );
    }

    #[test]
    fn test_accessors() {
        let event = ClientEvent::from(DomainEvent::ResourceDeleted { id: 1 });
        assert!(event.as_domain().is_some());
        assert!(event.as_lifecycle().is_none());
    }
}
