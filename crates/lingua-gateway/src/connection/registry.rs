//! Connection registry
//!
//! Tracks which connections are members of which room. Both directions
//! (room to members, connection to room) live under one lock so a
//! connection is never visible in a room it has left, and a room with no
//! members is dropped on the spot, together with its fan-out lock.

use super::{Connection, ConnectionId};
use chrono::{DateTime, Utc};
use lingua_common::{AppError, RoomClaims};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// A connection's verified membership in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSession {
    pub connection_id: ConnectionId,
    pub user_id: i64,
    pub nickname: String,
    pub room_id: String,
    pub joined_at: DateTime<Utc>,
}

impl RoomSession {
    /// Build a session from verified credential claims
    #[must_use]
    pub fn new(connection_id: ConnectionId, claims: &RoomClaims) -> Self {
        Self {
            connection_id,
            user_id: claims.user_id,
            nickname: claims.nickname.clone(),
            room_id: claims.room_id.clone(),
            joined_at: Utc::now(),
        }
    }
}

/// Registration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    #[error("session belongs to connection {session}, not {connection}")]
    ConnectionMismatch {
        connection: ConnectionId,
        session: ConnectionId,
    },

    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::RegistrationFailure(err.to_string())
    }
}

struct Member {
    connection: Arc<Connection>,
    session: RoomSession,
}

/// Serializes broadcasts into one room
pub type FanoutLock = Arc<Mutex<()>>;

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, Member>,
    fanout: FanoutLock,
}

#[derive(Default)]
struct RoomTable {
    rooms: HashMap<String, Room>,
    index: HashMap<ConnectionId, String>,
}

/// Room-scoped registry of live connections
///
/// Never held across an await point; callers get snapshots.
#[derive(Default)]
pub struct ConnectionRegistry {
    table: RwLock<RoomTable>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a connection to the session's room
    ///
    /// If another connection in the same room already uses the session's
    /// nickname, it is removed and returned so the caller can close it.
    pub fn register(
        &self,
        connection: Arc<Connection>,
        session: RoomSession,
    ) -> Result<Option<Arc<Connection>>, RegistryError> {
        let id = connection.id();
        if session.connection_id != id {
            return Err(RegistryError::ConnectionMismatch {
                connection: id,
                session: session.connection_id,
            });
        }
        if connection.is_closed() {
            return Err(RegistryError::ConnectionClosed(id));
        }

        let room_id = session.room_id.clone();
        let nickname = session.nickname.clone();

        let superseded = {
            let mut guard = self.table.write();
            let table = &mut *guard;

            if table.index.contains_key(&id) {
                return Err(RegistryError::AlreadyRegistered(id));
            }

            let members = &mut table.rooms.entry(room_id.clone()).or_default().members;
            let previous = members
                .iter()
                .find(|(_, member)| member.session.nickname == nickname)
                .map(|(previous_id, _)| *previous_id);
            let superseded = previous
                .and_then(|previous_id| members.remove(&previous_id))
                .map(|member| member.connection);

            members.insert(
                id,
                Member {
                    connection,
                    session,
                },
            );

            if let Some(previous) = &superseded {
                table.index.remove(&previous.id());
            }
            table.index.insert(id, room_id.clone());

            superseded
        };

        tracing::debug!(
            connection_id = %id,
            room_id = %room_id,
            nickname = %nickname,
            superseded = superseded.is_some(),
            "Connection registered"
        );

        Ok(superseded)
    }

    /// Remove a connection from its room
    ///
    /// Idempotent: returns the session on the first call and `None` after.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<RoomSession> {
        let session = {
            let mut guard = self.table.write();
            let table = &mut *guard;

            let room_id = table.index.remove(&connection_id)?;
            let member = table
                .rooms
                .get_mut(&room_id)
                .and_then(|room| room.members.remove(&connection_id));

            if table.rooms.get(&room_id).is_some_and(|room| room.members.is_empty()) {
                table.rooms.remove(&room_id);
            }

            member.map(|member| member.session)
        };

        if let Some(session) = &session {
            tracing::debug!(
                connection_id = %connection_id,
                room_id = %session.room_id,
                "Connection unregistered"
            );
        }

        session
    }

    /// Look up the room session of a connection
    pub fn session_of(&self, connection_id: ConnectionId) -> Option<RoomSession> {
        let table = self.table.read();
        let room_id = table.index.get(&connection_id)?;
        table
            .rooms
            .get(room_id)
            .and_then(|room| room.members.get(&connection_id))
            .map(|member| member.session.clone())
    }

    /// Get a connection handle by id
    pub fn connection(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        let table = self.table.read();
        let room_id = table.index.get(&connection_id)?;
        table
            .rooms
            .get(room_id)
            .and_then(|room| room.members.get(&connection_id))
            .map(|member| member.connection.clone())
    }

    /// Snapshot of a room's sessions, in join order
    pub fn members_of(&self, room_id: &str) -> Vec<RoomSession> {
        let mut sessions: Vec<RoomSession> = self
            .table
            .read()
            .rooms
            .get(room_id)
            .map(|room| room.members.values().map(|m| m.session.clone()).collect())
            .unwrap_or_default();

        sessions.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.nickname.cmp(&b.nickname))
        });
        sessions
    }

    /// Snapshot of a room's connection handles
    pub fn recipients_of(&self, room_id: &str) -> Vec<Arc<Connection>> {
        self.table
            .read()
            .rooms
            .get(room_id)
            .map(Room::connections)
            .unwrap_or_default()
    }

    /// The fan-out lock of a live room
    ///
    /// The lock is created with the room and dropped when the room is evicted.
    pub fn fanout_lock(&self, room_id: &str) -> Option<FanoutLock> {
        self.table.read().rooms.get(room_id).map(|room| room.fanout.clone())
    }

    /// Snapshot of a room's connections, provided `lock` still guards the room
    ///
    /// Returns `None` if the room was evicted, or evicted and recreated,
    /// since `lock` was fetched.
    pub fn recipients_guarded_by(
        &self,
        room_id: &str,
        lock: &FanoutLock,
    ) -> Option<Vec<Arc<Connection>>> {
        self.table
            .read()
            .rooms
            .get(room_id)
            .filter(|room| Arc::ptr_eq(&room.fanout, lock))
            .map(Room::connections)
    }

    /// Number of members in a room
    pub fn member_count(&self, room_id: &str) -> usize {
        self.table
            .read()
            .rooms
            .get(room_id)
            .map_or(0, |room| room.members.len())
    }

    /// Check if a room has any members
    pub fn has_room(&self, room_id: &str) -> bool {
        self.table.read().rooms.contains_key(room_id)
    }

    /// Check if a connection is registered
    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.table.read().index.contains_key(&connection_id)
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.table.read().rooms.len()
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.table.read().index.len()
    }
}

impl Room {
    fn connections(&self) -> Vec<Arc<Connection>> {
        self.members.values().map(|m| m.connection.clone()).collect()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &table.index.len())
            .field("rooms", &table.rooms.len())
            .finish()
    }
}
