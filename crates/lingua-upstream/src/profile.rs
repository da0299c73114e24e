//! Profile service client

use async_trait::async_trait;
use lingua_common::UpstreamConfig;
use lingua_core::{ProfileDirectory, RepoResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::http::{build_client, decode_error, ensure_success, transport_error};

/// Single-field projection returned by `target_field=nickname`
#[derive(Debug, Deserialize)]
struct NicknameField {
    nickname: Option<String>,
}

/// HTTP client for the user/profile service
#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    config: UpstreamConfig,
}

impl ProfileClient {
    /// Create a new profile client
    pub fn new(config: UpstreamConfig) -> RepoResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ProfileDirectory for ProfileClient {
    async fn user_exists(&self, user_id: i64) -> RepoResult<bool> {
        let response = self
            .client
            .get(self.config.endpoint("/api/users"))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        ensure_success(response).await?.json().await.map_err(decode_error)
    }

    async fn nickname(&self, user_id: i64) -> RepoResult<Option<String>> {
        let response = self
            .client
            .get(self.config.endpoint("/users"))
            .query(&[
                ("user_id", user_id.to_string()),
                ("target_field", "nickname".to_string()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let field: NicknameField = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(decode_error)?;

        Ok(field.nickname.filter(|n| !n.is_empty()))
    }
}
