use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a single document relay. UUIDv7, so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayId(pub String);

impl RelayId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for RelayId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where relayed messages are posted.
///
/// Platform-native and opaque to the relay: a Telegram chat ID encoded as a
/// string, a Discord channel snowflake, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(pub String);

impl Destination {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Destination {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for Destination {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Opaque handle to a message previously created by an output channel.
///
/// Only the channel that issued it knows how to interpret the contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef(pub String);

impl MessageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_ids_are_unique() {
        assert_ne!(RelayId::new(), RelayId::new());
    }

    #[test]
    fn destination_from_chat_id() {
        let dest = Destination::from(-100_123_456_789_i64);
        assert_eq!(dest.as_str(), "-100123456789");
    }

    #[test]
    fn message_ref_display_is_raw() {
        let r = MessageRef::from("42");
        assert_eq!(r.to_string(), "42");
    }
}
