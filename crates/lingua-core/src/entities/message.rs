//! Chat message entity

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum number of characters accepted in a single chat message
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// A message relayed inside a chat room
///
/// `sender` is always the nickname taken from the verified credential of the
/// connection that produced the message, never from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    #[serde(with = "millis_timestamp")]
    pub created_at: DateTime<Utc>,
    pub room_id: String,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(
        sender: impl Into<String>,
        text: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        Self::at(sender, text, room_id, Utc::now())
    }

    /// Create a message with an explicit timestamp (truncated to milliseconds)
    pub fn at(
        sender: impl Into<String>,
        text: impl Into<String>,
        room_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            created_at: created_at.trunc_subsecs(3),
            room_id: room_id.into(),
        }
    }

    /// Check whether this message belongs to the given room
    #[inline]
    pub fn is_in_room(&self, room_id: &str) -> bool {
        self.room_id == room_id
    }
}

/// Client frame carrying the text of a new message
///
/// Any other fields the client sends (including a `sender`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundText {
    pub text: String,
}

impl InboundText {
    /// Parse a raw text frame
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::InvalidFrame(e.to_string()))
    }

    /// Validate the message body
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(DomainError::ContentTooLong {
                max: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(())
    }
}

/// RFC 3339 timestamps with millisecond precision, e.g. `2024-05-01T10:00:00.123Z`
mod millis_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
