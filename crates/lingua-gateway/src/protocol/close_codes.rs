//! WebSocket close codes
//!
//! Standard RFC 6455 codes used by the chat gateway plus the gateway's own
//! application range (4000-4999).

use serde::{Deserialize, Serialize};

/// Close codes sent when the gateway ends a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Session ended normally
    Normal = 1000,
    /// Server is going away or the peer vanished
    GoingAway = 1001,
    /// Client sent a binary frame
    UnsupportedData = 1003,
    /// Text frame was not a valid chat message
    InvalidPayload = 1007,
    /// Credential missing, invalid, expired, or for another room
    PolicyViolation = 1008,
    /// Message text longer than allowed
    MessageTooBig = 1009,
    /// Join or message history failure
    InternalError = 1011,
    /// Same nickname joined the room from another connection
    Superseded = 4000,
    /// Outbound queue overflowed
    SlowConsumer = 4001,
    /// Nothing received within the idle timeout
    IdleTimeout = 4002,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1000 => Some(Self::Normal),
            1001 => Some(Self::GoingAway),
            1003 => Some(Self::UnsupportedData),
            1007 => Some(Self::InvalidPayload),
            1008 => Some(Self::PolicyViolation),
            1009 => Some(Self::MessageTooBig),
            1011 => Some(Self::InternalError),
            4000 => Some(Self::Superseded),
            4001 => Some(Self::SlowConsumer),
            4002 => Some(Self::IdleTimeout),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if the client may reconnect with the same credential
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::GoingAway | Self::InternalError | Self::SlowConsumer | Self::IdleTimeout
        )
    }

    /// Default close reason sent with this code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Normal => "Session closed",
            Self::GoingAway => "Going away",
            Self::UnsupportedData => "Binary frames are not supported",
            Self::InvalidPayload => "Invalid message payload",
            Self::PolicyViolation => "Authentication failed",
            Self::MessageTooBig => "Message too long",
            Self::InternalError => "Internal error",
            Self::Superseded => "Session superseded",
            Self::SlowConsumer => "Slow consumer",
            Self::IdleTimeout => "Idle timeout",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::GoingAway => "GoingAway",
            Self::UnsupportedData => "UnsupportedData",
            Self::InvalidPayload => "InvalidPayload",
            Self::PolicyViolation => "PolicyViolation",
            Self::MessageTooBig => "MessageTooBig",
            Self::InternalError => "InternalError",
            Self::Superseded => "Superseded",
            Self::SlowConsumer => "SlowConsumer",
            Self::IdleTimeout => "IdleTimeout",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
