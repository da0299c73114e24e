//! Chat sessions
//!
//! Drives one WebSocket connection from handshake to close.

mod handler;
mod state;

pub use handler::{prepare_history, ChatParams, ChatSession};
pub use state::SessionState;
