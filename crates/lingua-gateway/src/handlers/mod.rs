//! HTTP handlers
//!
//! Credential issuance for clients plus the worker-facing room endpoints.

mod admin;
mod health;
mod token;

pub use admin::{
    notify_session_end, room_status, NotifyResponse, RoomStatusResponse, SessionEndRequest,
    DEFAULT_SESSION_END_REASON,
};
pub use health::{health_check, HealthResponse};
pub use token::{create_token, CreateTokenParams, TokenResponse};
