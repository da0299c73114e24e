//! WebSocket upgrade handler

use crate::server::GatewayState;
use crate::session::{ChatParams, ChatSession};
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
};

/// Chat endpoint
///
/// GET /ws/chat?room_id={room}&token={credential}
///
/// The upgrade always succeeds; credential problems close the socket with
/// a policy-violation code.
pub async fn chat_handler(
    State(state): State<GatewayState>,
    Query(params): Query<ChatParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ChatSession::new(state, params).run(socket))
}
