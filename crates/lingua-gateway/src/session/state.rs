//! Session lifecycle states

use serde::Serialize;

/// Lifecycle of one chat session
///
/// `Connecting -> Authenticating -> Joining -> Active -> Closing -> Closed`,
/// where any state before `Closing` may jump straight to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Socket accepted, nothing checked yet
    Connecting,
    /// Verifying the credential against the requested room
    Authenticating,
    /// Registering with the room
    Joining,
    /// Relaying messages
    Active,
    /// Leaving the room and closing the socket
    Closing,
    /// Terminal
    Closed,
}

impl SessionState {
    /// Check if moving to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Connecting, Self::Authenticating)
            | (Self::Authenticating, Self::Joining)
            | (Self::Joining, Self::Active)
            | (Self::Closing, Self::Closed) => true,
            (Self::Closing | Self::Closed, Self::Closing) => false,
            (_, Self::Closing) => true,
            _ => false,
        }
    }

    /// Check if the session has started shutting down
    #[must_use]
    pub const fn is_closing(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    /// Check if the session is registered and relaying
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Joining => "joining",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
