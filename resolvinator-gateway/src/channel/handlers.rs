//! Topic handlers: turn the payload of one frame into domain events.

use resolvinator_core::events::{DomainEvent, EventPriority, SystemEventKind};
use resolvinator_core::types::UserId;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::sanitize::{escape_field, escape_markup};

/// Parses frames of the topics it matches.
///
/// Handlers never fail: a payload they cannot use is logged and yields no
/// events.
pub trait TopicHandler: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if frames on `topic` belong to this handler.
    fn matches(&self, topic: &str) -> bool;

    /// Converts one frame into zero or more events.
    fn handle(&self, event: &str, payload: Value) -> Vec<DomainEvent>;
}

/// Risk lifecycle on `risks:<project>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceHandler;

impl TopicHandler for ResourceHandler {
    fn name(&self) -> &'static str {
        "resource"
    }

    fn matches(&self, topic: &str) -> bool {
        topic.starts_with("risks:")
    }

    fn handle(&self, event: &str, payload: Value) -> Vec<DomainEvent> {
        let parsed = match event {
            "risk:created" => Some(DomainEvent::ResourceCreated { resource: payload }),
            "risk:updated" => Some(DomainEvent::ResourceUpdated { resource: payload }),
            "risk:deleted" => {
                numeric_id(event, &payload).map(|id| DomainEvent::ResourceDeleted { id })
            }
            _ => unhandled(self.name(), event),
        };
        parsed.into_iter().collect()
    }
}

/// Mitigation and task lifecycle on `project:<project>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectHandler;

impl TopicHandler for ProjectHandler {
    fn name(&self) -> &'static str {
        "project"
    }

    fn matches(&self, topic: &str) -> bool {
        topic.starts_with("project:")
    }

    fn handle(&self, event: &str, payload: Value) -> Vec<DomainEvent> {
        let parsed = match event {
            "mitigation:created" => Some(DomainEvent::MitigationCreated {
                mitigation: payload,
            }),
            "mitigation:updated" => Some(DomainEvent::MitigationUpdated {
                mitigation: payload,
            }),
            "mitigation:deleted" => {
                numeric_id(event, &payload).map(|id| DomainEvent::MitigationDeleted { id })
            }
            "task:created" => Some(DomainEvent::TaskCreated { task: payload }),
            "task:updated" => Some(DomainEvent::TaskUpdated { task: payload }),
            "task:completed" => Some(DomainEvent::TaskCompleted { task: payload }),
            _ => unhandled(self.name(), event),
        };
        parsed.into_iter().collect()
    }
}

/// Presence and chat on `user:<id>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserHandler;

impl UserHandler {
    fn presence(diff: &Value) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        for (key, online) in [("joins", true), ("leaves", false)] {
            let Some(entries) = diff.get(key).and_then(Value::as_object) else {
                continue;
            };
            for raw in entries.keys() {
                match raw.parse::<UserId>() {
                    Ok(user_id) => events.push(DomainEvent::PresenceChanged { user_id, online }),
                    Err(_) => warn!(user_id = %raw, "Skipping non-numeric user id in presence diff"),
                }
            }
        }
        events
    }
}

impl TopicHandler for UserHandler {
    fn name(&self) -> &'static str {
        "user"
    }

    fn matches(&self, topic: &str) -> bool {
        topic.starts_with("user:")
    }

    fn handle(&self, event: &str, mut payload: Value) -> Vec<DomainEvent> {
        if let Some(from) = payload.get("from_user_id")
            && UserId::from_json(from).is_none()
        {
            warn!(event, from_user_id = %from, "Dropping frame with non-numeric sender");
            return Vec::new();
        }

        match event {
            "new_message" => {
                escape_field(&mut payload, "content");
                vec![DomainEvent::Message { payload }]
            }
            "presence_diff" => Self::presence(&payload),
            _ => unhandled(self.name(), event).into_iter().collect(),
        }
    }
}

/// System conditions on the exact topic `system`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHandler;

impl SystemHandler {
    fn kind(event: &str) -> Option<SystemEventKind> {
        match event {
            "system:maintenance_start" => Some(SystemEventKind::MaintenanceStarted),
            "system:maintenance_end" => Some(SystemEventKind::MaintenanceEnded),
            "system:update_available" => Some(SystemEventKind::UpdateAvailable),
            "system:disk_space_warning" => Some(SystemEventKind::DiskSpaceLow),
            _ => None,
        }
    }
}

impl TopicHandler for SystemHandler {
    fn name(&self) -> &'static str {
        "system"
    }

    fn matches(&self, topic: &str) -> bool {
        topic == "system"
    }

    fn handle(&self, event: &str, payload: Value) -> Vec<DomainEvent> {
        let mut events = Vec::with_capacity(2);
        match Self::kind(event) {
            Some(kind) => events.push(DomainEvent::SystemEvent {
                kind,
                payload: payload.clone(),
            }),
            None => debug!(event, "No system condition for event"),
        }
        events.push(DomainEvent::SystemStatusUpdated { payload });
        events
    }
}

/// Global `news` and `events` streams, dispatched on `payload.type`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BroadcastHandler;

impl BroadcastHandler {
    fn news(data: &Value) -> Option<DomainEvent> {
        let raw_priority = data
            .get("priority")
            .and_then(Value::as_str)
            .unwrap_or(EventPriority::Normal.as_str());
        let Some(priority) = EventPriority::from_wire(raw_priority) else {
            warn!(priority = raw_priority, "Dropping news with unknown priority");
            return None;
        };

        let title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let message = escape_markup(data.get("message").and_then(Value::as_str).unwrap_or_default());

        Some(DomainEvent::NewsBroadcast {
            title,
            message,
            priority,
        })
    }

    fn system_event(payload: &Value) -> Option<DomainEvent> {
        let name = payload.get("event").and_then(Value::as_str).unwrap_or_default();
        let Some(kind) = SystemEventKind::from_wire(name) else {
            warn!(kind = name, "Dropping unknown system event");
            return None;
        };
        let data = payload
            .get("payload")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        Some(DomainEvent::SystemEvent {
            kind,
            payload: data,
        })
    }
}

impl TopicHandler for BroadcastHandler {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn matches(&self, topic: &str) -> bool {
        matches!(topic, "news" | "events")
    }

    fn handle(&self, event: &str, payload: Value) -> Vec<DomainEvent> {
        let parsed = match payload.get("type").and_then(Value::as_str) {
            Some("news") => payload.get("payload").and_then(Self::news),
            Some("system_event") => Self::system_event(&payload),
            other => {
                debug!(event, kind = ?other, "Ignoring broadcast");
                None
            }
        };
        parsed.into_iter().collect()
    }
}

fn numeric_id(event: &str, payload: &Value) -> Option<i64> {
    let id = payload.get("id").and_then(Value::as_i64);
    if id.is_none() {
        warn!(event, "Dropping frame without numeric id");
    }
    id
}

fn unhandled(handler: &str, event: &str) -> Option<DomainEvent> {
    debug!(handler, event, "Unhandled event");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_risk_deleted_carries_id() {
        let events = ResourceHandler.handle("risk:deleted", json!({"id": 5}));
        assert_eq!(events, vec![DomainEvent::ResourceDeleted { id: 5 }]);
    }

    #[test]
    fn test_risk_deleted_without_id_is_dropped() {
        assert!(ResourceHandler.handle("risk:deleted", json!({"id": "5"})).is_empty());
        assert!(ResourceHandler.handle("risk:deleted", json!({})).is_empty());
    }

    #[test]
    fn test_risk_updated_passes_object_through() {
        let risk = json!({"id": 1, "name": "Flood", "impact": {"score": 4}});
        let events = ResourceHandler.handle("risk:updated", risk.clone());
        assert_eq!(events, vec![DomainEvent::ResourceUpdated { resource: risk }]);
    }

    #[test]
    fn test_project_events() {
        let handler = ProjectHandler;
        assert!(matches!(
            handler.handle("mitigation:created", json!({"id": 1}))[..],
            [DomainEvent::MitigationCreated { .. }]
        ));
        assert_eq!(
            handler.handle("mitigation:deleted", json!({"id": 8})),
            vec![DomainEvent::MitigationDeleted { id: 8 }]
        );
        assert!(matches!(
            handler.handle("task:completed", json!({"id": 2}))[..],
            [DomainEvent::TaskCompleted { .. }]
        ));
        assert!(handler.handle("task:archived", json!({})).is_empty());
    }

    #[test]
    fn test_presence_joins_before_leaves() {
        let events = UserHandler.handle(
            "presence_diff",
            json!({"leaves": {"9": {}}, "joins": {"7": {}}}),
        );
        assert_eq!(
            events,
            vec![
                DomainEvent::PresenceChanged {
                    user_id: UserId::new(7),
                    online: true
                },
                DomainEvent::PresenceChanged {
                    user_id: UserId::new(9),
                    online: false
                },
            ]
        );
    }

    #[test]
    fn test_presence_skips_bad_keys() {
        let events = UserHandler.handle("presence_diff", json!({"joins": {"abc": {}, "3": {}}}));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_new_message_content_is_escaped() {
        let events = UserHandler.handle(
            "new_message",
            json!({"content": "<img src=x onerror=alert(1)>", "from_user_id": 4}),
        );
        let [DomainEvent::Message { payload }] = &events[..] else {
            panic!("expected one message, got {events:?}");
        };
        assert_eq!(payload["content"], "&lt;img src=x onerror=alert(1)&gt;");
        assert_eq!(payload["from_user_id"], 4);
    }

    #[test]
    fn test_non_numeric_sender_is_dropped() {
        let events = UserHandler.handle(
            "new_message",
            json!({"content": "hi", "from_user_id": "4"}),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_system_maps_known_and_always_reports_status() {
        let events = SystemHandler.handle("system:disk_space_warning", json!({"free": "1GB"}));
        assert_eq!(
            events,
            vec![
                DomainEvent::SystemEvent {
                    kind: SystemEventKind::DiskSpaceLow,
                    payload: json!({"free": "1GB"})
                },
                DomainEvent::SystemStatusUpdated {
                    payload: json!({"free": "1GB"})
                },
            ]
        );

        let unknown = SystemHandler.handle("system:reboot", json!({}));
        assert_eq!(
            unknown,
            vec![DomainEvent::SystemStatusUpdated { payload: json!({}) }]
        );
    }

    #[test]
    fn test_system_matches_exact_topic_only() {
        assert!(SystemHandler.matches("system"));
        assert!(!SystemHandler.matches("system:1"));
    }

    #[test]
    fn test_news_broadcast() {
        let events = BroadcastHandler.handle(
            "broadcast",
            json!({"type": "news", "payload": {"title": "Outage", "message": "<b>down</b>", "priority": "high"}}),
        );
        assert_eq!(
            events,
            vec![DomainEvent::NewsBroadcast {
                title: "Outage".to_string(),
                message: "&lt;b&gt;down&lt;/b&gt;".to_string(),
                priority: EventPriority::High,
            }]
        );
    }

    #[test]
    fn test_news_defaults_and_unknown_priority() {
        let events =
            BroadcastHandler.handle("broadcast", json!({"type": "news", "payload": {"message": "m"}}));
        assert_eq!(
            events,
            vec![DomainEvent::NewsBroadcast {
                title: String::new(),
                message: "m".to_string(),
                priority: EventPriority::Normal,
            }]
        );

        let dropped = BroadcastHandler.handle(
            "broadcast",
            json!({"type": "news", "payload": {"message": "m", "priority": "urgent"}}),
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_broadcast_system_event() {
        let events = BroadcastHandler.handle(
            "broadcast",
            json!({"type": "system_event", "event": "session_expired", "payload": {"user": 1}}),
        );
        assert_eq!(
            events,
            vec![DomainEvent::SystemEvent {
                kind: SystemEventKind::SessionExpired,
                payload: json!({"user": 1})
            }]
        );

        let unknown = BroadcastHandler.handle(
            "broadcast",
            json!({"type": "system_event", "event": "coffee_break"}),
        );
        assert!(unknown.is_empty());
    }
}
