//! Credential issuance
//!
//! Clients exchange a user id and the room the matchmaker placed them in
//! for a short-lived room credential. The nickname embedded in the
//! credential comes from the profile service, never from the client.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use lingua_core::DomainError;
use serde::{Deserialize, Serialize};

use crate::response::{ApiError, ApiResult};
use crate::server::GatewayState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenParams {
    pub user_id: i64,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a room credential
///
/// GET /api/user/create_token?user_id={id}&room_id={room}
pub async fn create_token(
    State(state): State<GatewayState>,
    query: Result<Query<CreateTokenParams>, QueryRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Query(params) = query?;

    if params.room_id.is_empty() {
        return Err(ApiError::invalid_query("room_id must not be empty"));
    }

    let profiles = state.profiles();
    if !profiles.user_exists(params.user_id).await? {
        return Err(DomainError::UserNotFound(params.user_id).into());
    }

    let nickname = profiles
        .nickname(params.user_id)
        .await?
        .ok_or(DomainError::UserNotFound(params.user_id))?;

    let token = state
        .authority()
        .issue(params.user_id, &nickname, &params.room_id)?;

    tracing::info!(
        user_id = params.user_id,
        room_id = %params.room_id,
        "Room credential issued"
    );

    Ok(Json(TokenResponse { token }))
}
