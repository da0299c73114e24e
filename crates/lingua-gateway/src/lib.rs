//! # lingua-gateway
//!
//! Real-time chat gateway: room-scoped WebSocket sessions with history
//! replay, plus the HTTP endpoints around them (credential issuance,
//! room status, forced session end).

pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod response;
pub mod server;
pub mod session;

pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
