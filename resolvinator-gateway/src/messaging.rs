//! Private chat over the user's own channel.

use resolvinator_core::error::{ProtocolError, ResolvinatorError};
use resolvinator_core::events::{ChatMessage, DomainEvent};
use resolvinator_core::traits::MessageCipher;
use resolvinator_core::types::{ChannelTopic, UserId};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::channel::{ChannelClient, escape_markup};

/// Event carrying a chat message in both directions.
pub const NEW_MESSAGE: &str = "new_message";

/// Sends and decodes end-to-end encrypted chat messages.
///
/// Outgoing messages go to `user:<self>` and name their recipient in the
/// payload; the server relays them to the recipient's channel.
#[derive(Clone)]
pub struct MessagingClient {
    channel: ChannelClient,
    user_id: UserId,
    cipher: Arc<dyn MessageCipher>,
}

impl MessagingClient {
    /// Creates a messaging client for `user_id` on top of `channel`.
    #[must_use]
    pub fn new(channel: ChannelClient, user_id: UserId, cipher: Arc<dyn MessageCipher>) -> Self {
        Self {
            channel,
            user_id,
            cipher,
        }
    }

    /// The underlying channel client.
    #[must_use]
    pub fn channel(&self) -> &ChannelClient {
        &self.channel
    }

    /// The user's own topic.
    #[must_use]
    pub fn topic(&self) -> ChannelTopic {
        ChannelTopic::user(self.user_id)
    }

    /// Joins the user's own topic.
    pub async fn join_user_channel(&self) -> Result<(), ResolvinatorError> {
        self.channel
            .join(self.topic(), Value::Object(serde_json::Map::new()))
            .await?;
        Ok(())
    }

    /// Encrypts `content` for `recipient` and sends it.
    ///
    /// Returns the frame's ref, or `None` if the client is not connected.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if encryption fails and a network error if
    /// the client task has stopped.
    pub async fn send_message(
        &self,
        recipient: UserId,
        content: &str,
    ) -> Result<Option<String>, ResolvinatorError> {
        let sealed = self.cipher.encrypt(content, recipient)?;
        let payload = json!({
            "recipient_id": recipient,
            "content": sealed,
            "encrypted": true,
        });
        debug!(recipient = %recipient, "Sending chat message");
        Ok(self.channel.send(self.topic(), NEW_MESSAGE, payload).await?)
    }

    /// Converts a [`DomainEvent::Message`] into a decrypted [`ChatMessage`].
    ///
    /// Returns `Ok(None)` for any other event.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidField` if the payload is not a chat
    /// message and `ProtocolError::Cipher` if decryption fails.
    pub fn decode(&self, event: &DomainEvent) -> Result<Option<ChatMessage>, ProtocolError> {
        let DomainEvent::Message { payload } = event else {
            return Ok(None);
        };

        let mut fields = payload.clone();
        if let Value::Object(map) = &mut fields
            && !map.contains_key("to_user_id")
        {
            let to = map
                .get("recipient_id")
                .cloned()
                .unwrap_or_else(|| json!(self.user_id));
            map.insert("to_user_id".to_string(), to);
        }
        let mut message: ChatMessage = serde_json::from_value(fields)
            .map_err(|e| ProtocolError::invalid_field("message", e.to_string()))?;

        let encrypted = payload.get("encrypted").and_then(Value::as_bool).unwrap_or(false);
        if encrypted {
            let peer = if message.from_user_id == self.user_id {
                message.to_user_id
            } else {
                message.from_user_id
            };
            // Plaintext only exists after decryption, so it is escaped here.
            message.content = escape_markup(&self.cipher.decrypt(&message.content, peer)?);
        }
        Ok(Some(message))
    }
}

impl std::fmt::Debug for MessagingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingClient")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
