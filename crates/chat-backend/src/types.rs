//! Wire types for the messaging backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix used for client-assigned provisional message ids. A message
/// carrying such an id has not been acknowledged by the backend yet.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// A fully-qualified channel reference (type + id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel type tag (e.g., "messaging").
    pub channel_type: String,
    /// Opaque channel identifier.
    pub id: String,
}

impl ChannelRef {
    /// Create a reference with an explicit type.
    pub fn new(channel_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            channel_type: channel_type.into(),
            id: id.into(),
        }
    }

    /// Create a reference of the default "messaging" type.
    pub fn messaging(id: impl Into<String>) -> Self {
        Self::new("messaging", id)
    }

    /// Compound id ("type:id") used for downstream addressing.
    pub fn cid(&self) -> String {
        format!("{}:{}", self.channel_type, self.id)
    }

    /// Parse a compound id of the form "type:id".
    pub fn parse_cid(cid: &str) -> Option<Self> {
        let (channel_type, id) = cid.split_once(':')?;
        if channel_type.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(channel_type, id))
    }
}

/// A message stored in a channel's append-only log.
///
/// Immutable once stored; `created_at` is the server-assigned timestamp and
/// is absent on provisional (locally echoed) copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id. Provisional ids carry [`LOCAL_ID_PREFIX`].
    pub id: String,
    /// Author identity.
    pub user_id: String,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Server-assigned timestamp; None for provisional copies.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether this message was authored by the given identity.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Whether this is a provisional local echo: client-assigned id or no
    /// server timestamp yet. Provisional messages are not eligible
    /// triggers.
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX) || self.created_at.is_none()
    }
}

/// A user to upsert in the backend (create-if-absent, else no-op).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSpec {
    /// User identity.
    pub id: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Backend-side role tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserSpec {
    /// A bare user with only an identity.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            role: None,
        }
    }

    /// A user with a display name.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            role: None,
        }
    }
}

/// A channel's queried state: current member set plus the most recent
/// messages in channel order (oldest-first), limited by the query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelState {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_round_trip() {
        let channel = ChannelRef::messaging("abc123");
        assert_eq!(channel.cid(), "messaging:abc123");

        let parsed = ChannelRef::parse_cid("messaging:abc123").unwrap();
        assert_eq!(parsed, channel);
    }

    #[test]
    fn test_parse_cid_rejects_malformed() {
        assert!(ChannelRef::parse_cid("no-separator").is_none());
        assert!(ChannelRef::parse_cid(":missing-type").is_none());
        assert!(ChannelRef::parse_cid("missing-id:").is_none());
    }

    #[test]
    fn test_provisional_detection() {
        let acked = Message {
            id: "msg-1".to_string(),
            user_id: "alice".to_string(),
            text: "hi".to_string(),
            created_at: Some(Utc::now()),
        };
        assert!(!acked.is_provisional());

        let local_id = Message {
            id: format!("{}42", LOCAL_ID_PREFIX),
            created_at: Some(Utc::now()),
            ..acked.clone()
        };
        assert!(local_id.is_provisional());

        let no_timestamp = Message {
            created_at: None,
            ..acked
        };
        assert!(no_timestamp.is_provisional());
    }

    #[test]
    fn test_is_from() {
        let message = Message {
            id: "msg-1".to_string(),
            user_id: "solace-bot".to_string(),
            text: "hello".to_string(),
            created_at: Some(Utc::now()),
        };
        assert!(message.is_from("solace-bot"));
        assert!(!message.is_from("alice"));
    }
}
