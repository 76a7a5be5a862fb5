//! Classifies validated frames and dispatches them to topic handlers.

use resolvinator_core::events::{ClientEvent, LifecycleEvent};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::frame::{InboundFrame, PHX_ERROR, PHX_REPLY};
use super::handlers::{
    BroadcastHandler, ProjectHandler, ResourceHandler, SystemHandler, TopicHandler, UserHandler,
};

/// Events that are always written to the audit log.
const AUDITED_EVENTS: [&str; 3] = ["user:join", "user:leave", "system:update"];

/// Routes frames to the first registered handler whose topic matches.
pub struct MessageRouter {
    handlers: Vec<Box<dyn TopicHandler>>,
}

impl MessageRouter {
    /// Creates a router with no handlers; every frame is dropped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Router for the full protocol: risks, project, user, system and broadcasts.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_handler(ResourceHandler)
            .with_handler(ProjectHandler)
            .with_handler(UserHandler)
            .with_handler(SystemHandler)
            .with_handler(BroadcastHandler)
    }

    /// Registers a handler after those already present.
    #[must_use]
    pub fn with_handler(mut self, handler: impl TopicHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Names of the registered handlers, in match order.
    pub fn handler_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|h| h.name())
    }

    /// Turns one frame into the events to emit.
    pub fn route(&self, frame: InboundFrame) -> Vec<ClientEvent> {
        if frame.event == PHX_ERROR {
            if mentions_unauthorized(&frame.payload) {
                warn!(topic = %frame.topic, "Server rejected credentials");
                return vec![
                    LifecycleEvent::AuthenticationFailed {
                        reason: frame.payload.to_string(),
                    }
                    .into(),
                ];
            }
            warn!(topic = %frame.topic, payload = %frame.payload, "Channel error");
        }

        if AUDITED_EVENTS.contains(&frame.event.as_str()) {
            info!(
                target: "resolvinator::audit",
                topic = %frame.topic,
                event = %frame.event,
                "Sensitive event received"
            );
        }

        if frame.event == PHX_REPLY {
            let status = frame.payload.get("status").and_then(Value::as_str);
            if status == Some("ok") {
                info!(topic = %frame.topic, reference = ?frame.reference, "Channel reply ok");
            } else {
                warn!(topic = %frame.topic, status = ?status, payload = %frame.payload, "Channel reply not ok");
            }
            return Vec::new();
        }

        let Some(handler) = self.handlers.iter().find(|h| h.matches(&frame.topic)) else {
            debug!(topic = %frame.topic, event = %frame.event, "No handler for topic");
            return Vec::new();
        };

        debug!(handler = handler.name(), topic = %frame.topic, event = %frame.event, "Routing frame");
        handler
            .handle(&frame.event, frame.payload)
            .into_iter()
            .map(ClientEvent::from)
            .collect()
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("handlers", &self.handler_names().collect::<Vec<_>>())
            .finish()
    }
}

fn mentions_unauthorized(payload: &Value) -> bool {
    payload.to_string().to_ascii_lowercase().contains("unauthorized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolvinator_core::events::DomainEvent;
    use resolvinator_core::types::UserId;
    use serde_json::json;

    fn frame(topic: &str, event: &str, payload: Value) -> InboundFrame {
        InboundFrame {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            reference: None,
        }
    }

    #[test]
    fn test_unauthorized_error_stops_routing() {
        let router = MessageRouter::standard();
        let events = router.route(frame("risks:1", "phx_error", json!({"reason": "Unauthorized"})));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].as_lifecycle(),
            Some(LifecycleEvent::AuthenticationFailed { .. })
        ));
    }

    #[test]
    fn test_other_channel_errors_are_routed() {
        let router = MessageRouter::standard();
        let events = router.route(frame("system", "phx_error", json!({"reason": "crashed"})));
        assert_eq!(
            events,
            vec![ClientEvent::from(DomainEvent::SystemStatusUpdated {
                payload: json!({"reason": "crashed"})
            })]
        );
    }

    #[test]
    fn test_reply_produces_no_events() {
        let router = MessageRouter::standard();
        assert!(router.route(frame("risks:1", "phx_reply", json!({"status": "ok"}))).is_empty());
        assert!(router.route(frame("risks:1", "phx_reply", json!({"status": "error"}))).is_empty());
    }

    #[test]
    fn test_risk_deleted_on_project_topic() {
        let router = MessageRouter::standard();
        let events = router.route(frame("risks:42", "risk:deleted", json!({"id": 5})));
        assert_eq!(events, vec![ClientEvent::from(DomainEvent::ResourceDeleted { id: 5 })]);
    }

    #[test]
    fn test_presence_through_router() {
        let router = MessageRouter::standard();
        let events = router.route(frame(
            "user:1",
            "presence_diff",
            json!({"joins": {"7": {}}, "leaves": {"9": {}}}),
        ));
        let presence: Vec<_> = events
            .iter()
            .filter_map(ClientEvent::as_domain)
            .map(|e| match e {
                DomainEvent::PresenceChanged { user_id, online } => (*user_id, *online),
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(presence, vec![(UserId::new(7), true), (UserId::new(9), false)]);
    }

    #[test]
    fn test_unknown_topic_is_dropped() {
        let router = MessageRouter::standard();
        assert!(router.route(frame("weather:1", "rain", json!({}))).is_empty());
    }

    #[test]
    fn test_custom_handler_set() {
        let router = MessageRouter::new().with_handler(UserHandler);
        assert_eq!(router.handler_names().collect::<Vec<_>>(), vec!["user"]);
        assert!(router.route(frame("risks:1", "risk:deleted", json!({"id": 1}))).is_empty());
    }

    #[test]
    fn test_audited_event_still_routed() {
        let router = MessageRouter::standard();
        let events = router.route(frame("system", "system:update", json!({"v": 2})));
        assert_eq!(events.len(), 1);
    }
}
