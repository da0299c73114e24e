//! Chat session handler
//!
//! One `ChatSession` per WebSocket. The session authorizes the credential
//! against the requested room, joins the room, replays the room's history,
//! and then relays each inbound text frame to the room until the socket
//! closes. A separate writer task owns the socket's sending half and drains
//! the connection's outbound queue.

use crate::connection::{CloseRequest, Connection, ConnectionId, RoomSession};
use crate::protocol::{CloseCode, ServerFrame};
use crate::server::GatewayState;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use lingua_common::{AppError, RoomClaims};
use lingua_core::{ChatMessage, InboundText};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use super::SessionState;

/// Shortest ping period the writer accepts
const MIN_PING_INTERVAL: Duration = Duration::from_millis(100);

/// Query parameters of the chat endpoint
///
/// Missing values are treated as empty and fail authorization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub token: String,
}

/// Sort and filter a room's history for replay
///
/// Drops messages from other rooms and orders the rest oldest first,
/// keeping the store's order for equal timestamps.
pub fn prepare_history(mut messages: Vec<ChatMessage>, room_id: &str) -> Vec<ChatMessage> {
    messages.retain(|m| m.is_in_room(room_id));
    messages.sort_by_key(|m| m.created_at);
    messages
}

/// State machine for one chat connection
pub struct ChatSession {
    gateway: GatewayState,
    params: ChatParams,
    connection_id: ConnectionId,
    state: SessionState,
}

impl ChatSession {
    /// Create a session for a freshly accepted socket
    pub fn new(gateway: GatewayState, params: ChatParams) -> Self {
        Self {
            gateway,
            params,
            connection_id: ConnectionId::new(),
            state: SessionState::Connecting,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the socket until it closes
    pub async fn run(mut self, socket: WebSocket) {
        let chat = &self.gateway.config().chat;
        let (tx, rx) = mpsc::channel(chat.outbound_buffer.max(1));
        let ping_interval = chat.ping_interval().max(MIN_PING_INTERVAL);

        let connection = Connection::with_id(self.connection_id, tx);
        let (sink, mut stream) = socket.split();
        let writer = tokio::spawn(write_frames(connection.clone(), rx, sink, ping_interval));

        tracing::info!(
            connection_id = %self.connection_id,
            room_id = %self.params.room_id,
            "WebSocket connection established"
        );

        let request = self.serve(&connection, &mut stream).await;
        self.shutdown(&connection, request);

        if let Err(e) = writer.await {
            tracing::warn!(
                connection_id = %self.connection_id,
                error = %e,
                "Writer task failed"
            );
        }
    }

    /// Authenticate, join, greet, then relay; returns how to close
    async fn serve(
        &mut self,
        connection: &Arc<Connection>,
        stream: &mut SplitStream<WebSocket>,
    ) -> CloseRequest {
        self.transition(SessionState::Authenticating);

        let claims = match self
            .gateway
            .authority()
            .authorize(&self.params.token, &self.params.room_id)
        {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    room_id = %self.params.room_id,
                    error = %e,
                    "Credential rejected"
                );
                return CloseRequest::from(&e);
            }
        };

        self.transition(SessionState::Joining);

        let session = RoomSession::new(connection.id(), &claims);
        let registered = self
            .gateway
            .registry()
            .register(connection.clone(), session)
            .map_err(AppError::from);

        match registered {
            Ok(Some(previous)) => {
                tracing::info!(
                    connection_id = %self.connection_id,
                    superseded = %previous.id(),
                    room_id = %claims.room_id,
                    nickname = %claims.nickname,
                    "Previous connection superseded"
                );
                previous.close(CloseCode::Superseded);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    connection_id = %self.connection_id,
                    room_id = %claims.room_id,
                    error = %e,
                    "Failed to join room"
                );
                return CloseRequest::from(&e);
            }
        }

        self.transition(SessionState::Active);

        tracing::info!(
            connection_id = %self.connection_id,
            room_id = %claims.room_id,
            nickname = %claims.nickname,
            "Joined room"
        );

        if let Err(e) = self.greet(connection, &claims).await {
            return CloseRequest::from(&e);
        }

        self.relay_loop(connection, stream, &claims).await
    }

    /// Send the join acknowledgement and the room history
    async fn greet(
        &self,
        connection: &Connection,
        claims: &RoomClaims,
    ) -> Result<(), AppError> {
        let broadcaster = self.gateway.broadcaster();

        broadcaster
            .send_to_one(connection, ServerFrame::user_info(&claims.nickname))
            .await?;

        let history = self.gateway.history().read(&claims.room_id).await.map_err(|e| {
            tracing::error!(
                connection_id = %self.connection_id,
                room_id = %claims.room_id,
                error = %e,
                "Failed to read message history"
            );
            AppError::from(e)
        })?;

        let history = prepare_history(history, &claims.room_id);
        tracing::debug!(
            connection_id = %self.connection_id,
            count = history.len(),
            "Replaying room history"
        );

        broadcaster
            .send_to_one(connection, ServerFrame::message_history(history))
            .await?;
        Ok(())
    }

    async fn relay_loop(
        &self,
        connection: &Connection,
        stream: &mut SplitStream<WebSocket>,
        claims: &RoomClaims,
    ) -> CloseRequest {
        let idle_timeout = self.gateway.config().chat.idle_timeout();

        loop {
            let next = tokio::select! {
                request = connection.closed() => return request,
                next = timeout(idle_timeout, stream.next()) => next,
            };

            let message = match next {
                Err(_) => {
                    tracing::info!(connection_id = %self.connection_id, "Connection idle, closing");
                    return CloseRequest::new(CloseCode::IdleTimeout);
                }
                Ok(None) => return CloseRequest::new(CloseCode::Normal),
                Ok(Some(Err(e))) => {
                    tracing::debug!(
                        connection_id = %self.connection_id,
                        error = %e,
                        "WebSocket error"
                    );
                    return CloseRequest::new(CloseCode::GoingAway);
                }
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => {
                    if let Err(e) = self.relay(&text, claims).await {
                        return CloseRequest::from(&e);
                    }
                }
                Message::Binary(_) => {
                    tracing::debug!(
                        connection_id = %self.connection_id,
                        "Binary messages not supported"
                    );
                    return CloseRequest::new(CloseCode::UnsupportedData);
                }
                Message::Ping(_) | Message::Pong(_) => {
                    tracing::trace!(connection_id = %self.connection_id, "Keepalive received");
                }
                Message::Close(_) => {
                    tracing::debug!(
                        connection_id = %self.connection_id,
                        "Client closed connection"
                    );
                    return CloseRequest::new(CloseCode::Normal);
                }
            }
        }
    }

    /// Record one inbound text frame and broadcast it to the room
    async fn relay(&self, text: &str, claims: &RoomClaims) -> Result<(), AppError> {
        let inbound = InboundText::from_json(text).and_then(|inbound| {
            inbound.validate()?;
            Ok(inbound)
        });
        let inbound = inbound.map_err(|e| {
            tracing::debug!(
                connection_id = %self.connection_id,
                error = %e,
                "Inbound frame rejected"
            );
            AppError::from(e)
        })?;

        let message = ChatMessage::new(&claims.nickname, inbound.text, &claims.room_id);

        self.gateway.history().append(&message).await.map_err(|e| {
            tracing::error!(
                connection_id = %self.connection_id,
                room_id = %claims.room_id,
                error = %e,
                "Failed to append message"
            );
            AppError::from(e)
        })?;

        let report = self
            .gateway
            .broadcaster()
            .broadcast_to_room(&claims.room_id, &ServerFrame::new_message(message));

        tracing::trace!(
            connection_id = %self.connection_id,
            delivered = report.delivered,
            dropped = report.dropped,
            "Message relayed"
        );

        Ok(())
    }

    /// Leave the room and close the socket, exactly once
    fn shutdown(&mut self, connection: &Connection, request: CloseRequest) {
        if self.state.is_closing() {
            return;
        }
        self.transition(SessionState::Closing);

        if let Some(session) = self.gateway.registry().unregister(connection.id()) {
            tracing::info!(
                connection_id = %self.connection_id,
                room_id = %session.room_id,
                nickname = %session.nickname,
                "Left room"
            );
        }

        let code = request.code;
        connection.close_with(request);
        let sent = connection.close_request().map_or(code, |r| r.code);

        self.transition(SessionState::Closed);

        tracing::info!(
            connection_id = %self.connection_id,
            close_code = %sent,
            "WebSocket connection closed"
        );
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                connection_id = %self.connection_id,
                from = %self.state,
                to = %next,
                "Ignoring illegal session transition"
            );
            return;
        }
        tracing::trace!(
            connection_id = %self.connection_id,
            from = %self.state,
            to = %next,
            "Session transition"
        );
        self.state = next;
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("connection_id", &self.connection_id)
            .field("room_id", &self.params.room_id)
            .field("state", &self.state)
            .finish()
    }
}

/// Own the socket's sending half: drain the queue, ping, and send the close frame
async fn write_frames(
    connection: Arc<Connection>,
    mut rx: mpsc::Receiver<ServerFrame>,
    mut sink: SplitSink<WebSocket, Message>,
    ping_interval: Duration,
) {
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let request = loop {
        tokio::select! {
            biased;
            request = connection.closed() => break Some(request),
            frame = rx.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = write_frame(&mut sink, &frame).await {
                        tracing::debug!(
                            connection_id = %connection.id(),
                            error = %e,
                            "Socket write failed"
                        );
                        break None;
                    }
                }
                None => break None,
            },
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break None;
                }
            }
        }
    };

    let Some(request) = request else {
        // Socket is gone; wake the session so it leaves the room
        connection.close(CloseCode::GoingAway);
        return;
    };

    // Frames queued before the close still go out
    while let Ok(frame) = rx.try_recv() {
        if write_frame(&mut sink, &frame).await.is_err() {
            return;
        }
    }

    let frame = CloseFrame {
        code: request.code.as_u16(),
        reason: request.reason.into(),
    };
    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
        tracing::trace!(connection_id = %connection.id(), error = %e, "Close frame not sent");
    }
}

async fn write_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    match frame.to_json() {
        Ok(json) => sink.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!(
                frame_type = frame.frame_type(),
                error = %e,
                "Failed to serialize frame"
            );
            Ok(())
        }
    }
}
