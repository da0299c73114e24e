//! Room broadcaster
//!
//! Broadcasts are serialized per room, so every member of a room sees that
//! room's frames in the same order. Fan-out never waits on a recipient: a
//! member whose queue is full or gone is removed from the room and closed,
//! and the remaining members still get the frame. The per-room fan-out
//! lock belongs to the registry's room entry and goes away with the room.

use crate::connection::{Connection, ConnectionRegistry, DeliveryError};
use crate::protocol::ServerFrame;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one broadcast
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Members the frame was queued for
    pub delivered: usize,
    /// Members dropped because delivery failed
    pub dropped: usize,
}

/// Delivers frames to rooms and to single connections
pub struct RoomBroadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl RoomBroadcaster {
    /// Create a broadcaster over a registry
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster reads from
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Queue `frame` for every current member of `room_id`
    ///
    /// Members whose delivery fails are unregistered and closed.
    pub fn broadcast_to_room(&self, room_id: &str, frame: &ServerFrame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        while let Some(lock) = self.registry.fanout_lock(room_id) {
            let _guard = lock.lock();

            // Room evicted or recreated while we waited for its lock
            let Some(recipients) = self.registry.recipients_guarded_by(room_id, &lock) else {
                continue;
            };

            for connection in recipients {
                match connection.try_send(frame.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(err) => failed.push((connection, err)),
                }
            }
            break;
        }

        for (connection, err) in failed {
            self.drop_member(&connection, err);
            report.dropped += 1;
        }

        tracing::trace!(
            room_id = %room_id,
            frame_type = frame.frame_type(),
            delivered = report.delivered,
            dropped = report.dropped,
            "Frame broadcast to room"
        );

        report
    }

    /// Queue `frame` for a single connection, waiting for queue space
    pub async fn send_to_one(
        &self,
        connection: &Connection,
        frame: ServerFrame,
    ) -> Result<(), DeliveryError> {
        let frame_type = frame.frame_type();
        connection.send(frame).await.map_err(|err| {
            tracing::debug!(
                connection_id = %connection.id(),
                frame_type,
                error = %err,
                "Direct delivery failed"
            );
            err
        })
    }

    fn drop_member(&self, connection: &Connection, err: DeliveryError) {
        tracing::warn!(
            connection_id = %connection.id(),
            error = %err,
            "Dropping room member after failed delivery"
        );
        self.registry.unregister(connection.id());
        connection.close(err.close_code());
    }
}

impl std::fmt::Debug for RoomBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomBroadcaster")
            .field("registry", &self.registry)
            .finish()
    }
}
