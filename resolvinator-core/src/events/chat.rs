//! Private chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A private chat message between two users.
///
/// `content` is ciphertext on the wire; the messaging client decrypts it
/// with its configured cipher before handing the message out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-assigned identifier, absent for messages not yet stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Message body.
    pub content: String,
    /// Sender.
    pub from_user_id: UserId,
    /// Recipient.
    pub to_user_id: UserId,
    /// Whether the recipient has read the message.
    #[serde(default)]
    pub read: bool,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates an unsent message stamped with the current time.
    #[must_use]
    pub fn new(from: UserId, to: UserId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            from_user_id: from,
            to_user_id: to,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message_is_unread() {
        let msg = ChatMessage::new(UserId::new(1), UserId::new(2), "hi");
        assert!(!msg.read);
        assert!(msg.id.is_none());
        assert_eq!(msg.content, "hi");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "id": 10,
            "content": "hello",
            "from_user_id": 3,
            "to_user_id": 4,
            "created_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(msg.id, Some(10));
        assert_eq!(msg.from_user_id, UserId::new(3));
        assert!(!msg.read);
    }
}
