//! Chat wire protocol
//!
//! Outbound frame shapes and WebSocket close codes.

mod close_codes;
mod frames;

pub use close_codes::CloseCode;
pub use frames::ServerFrame;
