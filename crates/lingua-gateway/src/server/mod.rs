//! Gateway server setup
//!
//! Routes, collaborator wiring, and the listener loop.

mod handler;
mod state;

pub use handler::chat_handler;
pub use state::GatewayState;

use crate::handlers::{create_token, health_check, notify_session_end, room_status};
use axum::{
    routing::{get, post},
    Router,
};
use lingua_common::{AppConfig, AppError, HistoryBackend};
use lingua_core::{MessageHistoryStore, ProfileDirectory};
use lingua_upstream::{InMemoryMessageStore, ProfileClient, WorkerClient};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/chat", get(chat_handler))
        .nest("/api/user", user_routes())
        .nest("/api/worker", worker_routes())
}

/// Client-facing routes
fn user_routes() -> Router<GatewayState> {
    Router::new().route("/create_token", get(create_token))
}

/// Routes called by the matchmaking worker
fn worker_routes() -> Router<GatewayState> {
    Router::new()
        .route("/chat/rooms/:room_id/status", get(room_status))
        .route("/notify_session_end", post(notify_session_end))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build collaborators from configuration and create `GatewayState`
pub fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let history: Arc<dyn MessageHistoryStore> = match config.chat.history_backend {
        HistoryBackend::Worker => {
            tracing::info!(url = %config.worker.url, "Using worker message history");
            Arc::new(WorkerClient::new(config.worker.clone())?)
        }
        HistoryBackend::Memory => {
            tracing::warn!("Using in-memory message history; messages are lost on restart");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    tracing::info!(url = %config.profiles.url, "Using profile service");
    let profiles: Arc<dyn ProfileDirectory> =
        Arc::new(ProfileClient::new(config.profiles.clone())?);

    Ok(GatewayState::new(config, history, profiles))
}

/// Serve on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Config(format!("Listener has no local address: {e}")))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("Chat endpoint at ws://{}/ws/chat", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let address = config.server.address();

    let state = create_gateway_state(config)?;
    let app = create_app(state);

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {address}: {e}")))?;

    serve(listener, app).await
}
