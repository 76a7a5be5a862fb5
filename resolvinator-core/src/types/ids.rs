//! Numeric identifiers used in topics and payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a project; each project has a resource stream and a metadata stream.
///
/// ```
/// use resolvinator_core::types::ProjectId;
///
/// let id: ProjectId = "42".parse().unwrap();
/// assert_eq!(id.get(), 42);
/// assert!("forty-two".parse::<ProjectId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProjectId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// Identifier of a user, as carried in presence diffs and chat payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Reads a user id from a JSON value.
    ///
    /// Only JSON integers qualify; strings, floats and booleans do not.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value.as_i64().map(Self)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_id_parse() {
        assert_eq!("7".parse::<ProjectId>().unwrap(), ProjectId::new(7));
        assert!("-1".parse::<ProjectId>().is_err());
        assert!("".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_user_id_parse() {
        assert_eq!("9".parse::<UserId>().unwrap().get(), 9);
        assert!(matches!(
            "abc".parse::<UserId>(),
            Err(ValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn test_user_id_from_json_rejects_non_integers() {
        assert_eq!(UserId::from_json(&json!(12)), Some(UserId::new(12)));
        assert_eq!(UserId::from_json(&json!("12")), None);
        assert_eq!(UserId::from_json(&json!(1.5)), None);
        assert_eq!(UserId::from_json(&json!(true)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ProjectId::new(42).to_string(), "42");
        assert_eq!(UserId::new(-3).to_string(), "-3");
    }
}
