//! Worker-facing room endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use lingua_common::AppError;
use serde::{Deserialize, Serialize};

use crate::protocol::ServerFrame;
use crate::response::ApiResult;
use crate::server::GatewayState;

/// Reason sent when the worker does not give one
pub const DEFAULT_SESSION_END_REASON: &str = "Session ended";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatusResponse {
    pub room_id: String,
    pub user_count: usize,
    pub online_users: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionEndRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub status: String,
    pub message: String,
    /// Members the notice was queued for
    pub delivered: usize,
}

/// Who is in a room right now
///
/// GET /api/worker/chat/rooms/{room_id}/status
pub async fn room_status(
    State(state): State<GatewayState>,
    Path(room_id): Path<String>,
) -> Json<RoomStatusResponse> {
    let online_users: Vec<String> = state
        .registry()
        .members_of(&room_id)
        .into_iter()
        .map(|session| session.nickname)
        .collect();

    Json(RoomStatusResponse {
        room_id,
        user_count: online_users.len(),
        online_users,
    })
}

/// Tell every member of a room that the session is over
///
/// POST /api/worker/notify_session_end
///
/// Members stay connected; closing is left to the clients.
pub async fn notify_session_end(
    State(state): State<GatewayState>,
    body: Result<Json<SessionEndRequest>, JsonRejection>,
) -> ApiResult<Json<NotifyResponse>> {
    let Json(request) = body?;

    let room_id = request
        .room_id
        .filter(|room_id| !room_id.is_empty())
        .ok_or_else(|| AppError::validation("room_id is required"))?;
    let reason = request
        .reason
        .unwrap_or_else(|| DEFAULT_SESSION_END_REASON.to_string());

    let report = state
        .broadcaster()
        .broadcast_to_room(&room_id, &ServerFrame::session_ended(reason));

    tracing::info!(
        room_id = %room_id,
        delivered = report.delivered,
        dropped = report.dropped,
        "Session end notification sent"
    );

    Ok(Json(NotifyResponse {
        status: "success".to_string(),
        message: "Session end notification sent".to_string(),
        delivered: report.delivered,
    }))
}
