//! # lingua-core
//!
//! Domain layer containing chat entities and the traits for the external
//! collaborators the gateway talks to (message history, user profiles).
//! This crate has zero dependencies on infrastructure (HTTP, WebSocket, etc.).

pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{ChatMessage, InboundText, MAX_MESSAGE_LENGTH};
pub use error::DomainError;
pub use traits::{MessageHistoryStore, ProfileDirectory, RepoResult};
