//! Room broadcasting
//!
//! Fans frames out to every connection in a room.

mod broadcaster;

pub use broadcaster::{BroadcastReport, RoomBroadcaster};
