//! Connection management
//!
//! Per-socket handles and the room-scoped registry that owns them.

mod connection;
mod registry;

pub use connection::{CloseRequest, Connection, ConnectionId, DeliveryError};
pub use registry::{ConnectionRegistry, FanoutLock, RegistryError, RoomSession};
