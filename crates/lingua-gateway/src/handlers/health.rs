//! Health check handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::server::GatewayState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Registered chat connections
    pub connections: usize,
    /// Rooms with at least one member
    pub rooms: usize,
}

/// Liveness probe with live chat counters
///
/// GET /health
pub async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let registry = state.registry();
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: registry.connection_count(),
        rooms: registry.room_count(),
    })
}
