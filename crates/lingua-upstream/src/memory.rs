//! In-memory collaborators
//!
//! Process-local implementations used by tests and by the `memory` history
//! backend when no worker service is available.

use async_trait::async_trait;
use lingua_core::{ChatMessage, DomainError, MessageHistoryStore, ProfileDirectory, RepoResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Message log kept in memory, partitioned by room
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    rooms: RwLock<HashMap<String, Vec<ChatMessage>>>,
    unavailable: AtomicBool,
}

impl InMemoryMessageStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `UpstreamUnavailable` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total number of stored messages across all rooms
    pub fn len(&self) -> usize {
        self.rooms.read().values().map(Vec::len).sum()
    }

    /// Check if the store holds no messages
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::UpstreamUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageHistoryStore for InMemoryMessageStore {
    async fn read(&self, room_id: &str) -> RepoResult<Vec<ChatMessage>> {
        self.check_available()?;

        let mut messages = self.rooms.read().get(room_id).cloned().unwrap_or_default();
        // Stable: equal timestamps keep append order
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn append(&self, message: &ChatMessage) -> RepoResult<()> {
        self.check_available()?;

        self.rooms
            .write()
            .entry(message.room_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }
}

/// Fixed user directory
#[derive(Debug, Default, Clone)]
pub struct StaticProfileDirectory {
    nicknames: HashMap<i64, String>,
}

impl StaticProfileDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user
    #[must_use]
    pub fn with_user(mut self, user_id: i64, nickname: impl Into<String>) -> Self {
        self.nicknames.insert(user_id, nickname.into());
        self
    }
}

#[async_trait]
impl ProfileDirectory for StaticProfileDirectory {
    async fn user_exists(&self, user_id: i64) -> RepoResult<bool> {
        Ok(self.nicknames.contains_key(&user_id))
    }

    async fn nickname(&self, user_id: i64) -> RepoResult<Option<String>> {
        Ok(self.nicknames.get(&user_id).cloned())
    }
}
