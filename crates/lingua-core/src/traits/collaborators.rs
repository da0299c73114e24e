//! Collaborator traits (ports) - define the interface to external services
//!
//! The gateway does not own message persistence or user profiles. It reaches
//! them through these traits; the infrastructure layer provides HTTP and
//! in-memory implementations.

use async_trait::async_trait;

use crate::entities::ChatMessage;
use crate::error::DomainError;

/// Result type for collaborator operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Message History Store
// ============================================================================

/// Append log of chat messages scoped by room
#[async_trait]
pub trait MessageHistoryStore: Send + Sync {
    /// All messages of a room, oldest first
    async fn read(&self, room_id: &str) -> RepoResult<Vec<ChatMessage>>;

    /// Persist a new message
    async fn append(&self, message: &ChatMessage) -> RepoResult<()>;
}

// ============================================================================
// Profile Directory
// ============================================================================

/// Read-only view over registered users
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Check whether the user exists
    async fn user_exists(&self, user_id: i64) -> RepoResult<bool>;

    /// Get the user's public nickname
    async fn nickname(&self, user_id: i64) -> RepoResult<Option<String>>;
}
