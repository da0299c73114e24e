//! Integration test utilities for the chat gateway
//!
//! Spawns the full gateway on a loopback port with in-memory collaborators
//! and drives it over real HTTP and WebSocket connections.

pub mod client;

pub use client::*;
pub use helpers::*;
