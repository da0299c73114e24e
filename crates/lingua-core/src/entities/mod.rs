//! Domain entities - core business objects

mod message;

pub use message::{ChatMessage, InboundText, MAX_MESSAGE_LENGTH};
