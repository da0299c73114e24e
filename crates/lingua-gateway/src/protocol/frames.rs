//! Outbound chat frames
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```json
//! {"type": "user_info", "username": "alice"}
//! {"type": "message_history", "messages": [...]}
//! {"type": "new_message", "message": {...}}
//! {"type": "session_ended", "reason": "Session ended"}
//! ```

use lingua_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Frame sent from the gateway to a chat client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Join acknowledgement carrying the verified nickname
    UserInfo { username: String },
    /// Room history, oldest first
    MessageHistory { messages: Vec<ChatMessage> },
    /// Message relayed to every member of the room
    NewMessage { message: ChatMessage },
    /// Room session ended by the worker
    SessionEnded { reason: String },
}

impl ServerFrame {
    #[must_use]
    pub fn user_info(username: impl Into<String>) -> Self {
        Self::UserInfo {
            username: username.into(),
        }
    }

    #[must_use]
    pub fn message_history(messages: Vec<ChatMessage>) -> Self {
        Self::MessageHistory { messages }
    }

    #[must_use]
    pub fn new_message(message: ChatMessage) -> Self {
        Self::NewMessage { message }
    }

    #[must_use]
    pub fn session_ended(reason: impl Into<String>) -> Self {
        Self::SessionEnded {
            reason: reason.into(),
        }
    }

    /// Wire name of the frame type
    #[must_use]
    pub const fn frame_type(&self) -> &'static str {
        match self {
            Self::UserInfo { .. } => "user_info",
            Self::MessageHistory { .. } => "message_history",
            Self::NewMessage { .. } => "new_message",
            Self::SessionEnded { .. } => "session_ended",
        }
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
