//! Channel topic keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ProjectId, UserId, ValidationError};

/// Key identifying a joinable stream on the server, e.g. `risks:42` or `system`.
///
/// Topics are compared by exact string value; a topic is joined at most once
/// per connection.
///
/// # Examples
///
/// ```
/// use resolvinator_core::types::{ChannelTopic, ProjectId};
///
/// let topic = ChannelTopic::risks(ProjectId::new(42));
/// assert_eq!(topic.as_str(), "risks:42");
/// assert_eq!(topic.prefix(), Some("risks"));
/// assert!(ChannelTopic::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelTopic(String);

impl ChannelTopic {
    /// Creates a topic from a string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTopic` for an empty string and
    /// `ValidationError::InvalidTopic` if it contains whitespace or control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidTopic(s));
        }
        Ok(Self(s))
    }

    /// Resource (risk) stream of a project.
    #[must_use]
    pub fn risks(project: ProjectId) -> Self {
        Self(format!("risks:{project}"))
    }

    /// Metadata (mitigation/task) stream of a project.
    #[must_use]
    pub fn project(project: ProjectId) -> Self {
        Self(format!("project:{project}"))
    }

    /// Private stream of a user.
    #[must_use]
    pub fn user(user: UserId) -> Self {
        Self(format!("user:{user}"))
    }

    /// One of the singleton broadcast streams.
    #[must_use]
    pub fn stream(channel: StreamChannel) -> Self {
        Self(channel.as_str().to_string())
    }

    /// Returns the topic as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part before the first `:`, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Returns the part after the first `:`, if any.
    #[must_use]
    pub fn subtopic(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, rest)| rest)
    }
}

impl fmt::Display for ChannelTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelTopic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelTopic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ChannelTopic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ChannelTopic> for String {
    fn from(topic: ChannelTopic) -> Self {
        topic.0
    }
}

/// The singleton broadcast streams a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamChannel {
    /// Global news stream.
    News,
    /// Global events stream.
    Events,
    /// System status stream.
    System,
}

impl StreamChannel {
    /// All singleton streams, in subscription order.
    pub const ALL: [Self; 3] = [Self::News, Self::Events, Self::System];

    /// Returns the topic name of the stream.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Events => "events",
            Self::System => "system",
        }
    }

    /// Returns the stream's topic.
    #[must_use]
    pub fn topic(&self) -> ChannelTopic {
        ChannelTopic::stream(*self)
    }
}

impl fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamChannel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            "events" => Ok(Self::Events),
            "system" => Ok(Self::System),
            _ => Err(ValidationError::UnknownStream(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_constructors() {
        let id = ProjectId::new(7);
        assert_eq!(ChannelTopic::risks(id).as_str(), "risks:7");
        assert_eq!(ChannelTopic::project(id).as_str(), "project:7");
        assert_eq!(ChannelTopic::user(UserId::new(3)).as_str(), "user:3");
        assert_eq!(ChannelTopic::stream(StreamChannel::System).as_str(), "system");
    }

    #[test]
    fn test_topic_validation() {
        assert!(matches!(ChannelTopic::new(""), Err(ValidationError::EmptyTopic)));
        assert!(matches!(
            ChannelTopic::new("risks: 1"),
            Err(ValidationError::InvalidTopic(_))
        ));
        assert!(ChannelTopic::new("room:lobby").is_ok());
    }

    #[test]
    fn test_prefix_and_subtopic() {
        let topic = ChannelTopic::new("project:12").unwrap();
        assert_eq!(topic.prefix(), Some("project"));
        assert_eq!(topic.subtopic(), Some("12"));

        let system = StreamChannel::System.topic();
        assert_eq!(system.prefix(), None);
        assert_eq!(system.subtopic(), None);
    }

    #[test]
    fn test_stream_channel_parse() {
        assert_eq!("News".parse::<StreamChannel>().unwrap(), StreamChannel::News);
        assert_eq!("system".parse::<StreamChannel>().unwrap(), StreamChannel::System);
        assert!(matches!(
            "weather".parse::<StreamChannel>(),
            Err(ValidationError::UnknownStream(_))
        ));
    }

    #[test]
    fn test_topic_serde_as_string() {
        let topic = ChannelTopic::risks(ProjectId::new(1));
        assert_eq!(serde_json::to_string(&topic).unwrap(), "\"risks:1\"");
        assert_eq!(
            serde_json::from_str::<ChannelTopic>("\"risks:1\"").unwrap(),
            topic
        );
    }

    #[test]
    fn test_topic_deserialize_validates() {
        assert!(serde_json::from_str::<ChannelTopic>("\"\"").is_err());
        assert!(serde_json::from_str::<ChannelTopic>("\"risks: 1\"").is_err());
    }
}
