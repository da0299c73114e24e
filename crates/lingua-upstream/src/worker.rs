//! Worker service client
//!
//! The matchmaking worker owns the chat message log. The gateway reads a
//! room's history from it on join and appends every relayed message.

use async_trait::async_trait;
use lingua_common::UpstreamConfig;
use lingua_core::{ChatMessage, MessageHistoryStore, RepoResult};
use reqwest::Client;

use crate::http::{build_client, decode_error, ensure_success, transport_error};

/// HTTP client for the worker's message endpoints
#[derive(Debug, Clone)]
pub struct WorkerClient {
    client: Client,
    config: UpstreamConfig,
}

impl WorkerClient {
    /// Create a new worker client
    pub fn new(config: UpstreamConfig) -> RepoResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MessageHistoryStore for WorkerClient {
    async fn read(&self, room_id: &str) -> RepoResult<Vec<ChatMessage>> {
        let url = self.config.endpoint("/api/messages");

        let response = self
            .client
            .get(&url)
            .query(&[("room_id", room_id)])
            .send()
            .await
            .map_err(transport_error)?;

        let messages: Vec<ChatMessage> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;

        tracing::debug!(room_id = %room_id, count = messages.len(), "Fetched room history");

        Ok(messages)
    }

    async fn append(&self, message: &ChatMessage) -> RepoResult<()> {
        let url = self.config.endpoint("/messages");

        let response = self
            .client
            .post(&url)
            .query(&[("room_id", message.room_id.as_str())])
            .json(message)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;

        tracing::trace!(room_id = %message.room_id, "Message appended to worker log");

        Ok(())
    }
}
