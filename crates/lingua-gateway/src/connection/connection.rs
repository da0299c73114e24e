//! Individual WebSocket connection
//!
//! A `Connection` is the shared handle to one socket: a bounded outbound
//! queue drained by the socket's writer task, plus a one-shot close request
//! that any holder (session, broadcaster, registry owner) may set.

use crate::protocol::{CloseCode, ServerFrame};
use lingua_common::AppError;
use lingua_core::DomainError;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

/// Opaque per-socket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a frame could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection is closed")]
    Closed,
    #[error("outbound queue is full")]
    Full,
}

impl DeliveryError {
    /// Close code to end the connection with after this failure
    #[must_use]
    pub const fn close_code(self) -> CloseCode {
        match self {
            Self::Closed => CloseCode::GoingAway,
            Self::Full => CloseCode::SlowConsumer,
        }
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        AppError::DeliveryFailure(err.to_string())
    }
}

/// Request to close a connection, sent to the client as its close frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub code: CloseCode,
    pub reason: String,
}

impl CloseRequest {
    /// Close with the code's default reason
    #[must_use]
    pub fn new(code: CloseCode) -> Self {
        Self::with_reason(code, code.description())
    }

    #[must_use]
    pub fn with_reason(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// How a session failure is reported to the client
impl From<&AppError> for CloseRequest {
    fn from(err: &AppError) -> Self {
        match err {
            e if e.is_auth_failure() => {
                Self::with_reason(CloseCode::PolicyViolation, e.to_string())
            }
            AppError::RegistrationFailure(_) => {
                Self::with_reason(CloseCode::InternalError, "Failed to join room")
            }
            AppError::DeliveryFailure(_) => Self::new(CloseCode::GoingAway),
            AppError::Domain(DomainError::InvalidFrame(_)) => Self::new(CloseCode::InvalidPayload),
            AppError::Domain(e @ DomainError::ContentTooLong { .. }) => {
                Self::with_reason(CloseCode::MessageTooBig, e.to_string())
            }
            AppError::UpstreamUnavailable(_) => {
                Self::with_reason(CloseCode::InternalError, "Message history unavailable")
            }
            AppError::Domain(e) if e.is_upstream() => {
                Self::with_reason(CloseCode::InternalError, "Message history unavailable")
            }
            _ => Self::new(CloseCode::InternalError),
        }
    }
}

/// Shared handle to one WebSocket connection
pub struct Connection {
    id: ConnectionId,

    /// Queue drained by the socket writer
    sender: mpsc::Sender<ServerFrame>,

    /// First close request wins
    close_request: Mutex<Option<CloseRequest>>,

    /// Wakes everyone waiting in `closed()`
    close_notify: Notify,

    created_at: Instant,
}

impl Connection {
    /// Create a connection with a fresh id
    pub fn new(sender: mpsc::Sender<ServerFrame>) -> Arc<Self> {
        Self::with_id(ConnectionId::new(), sender)
    }

    /// Create a connection with a known id
    pub fn with_id(id: ConnectionId, sender: mpsc::Sender<ServerFrame>) -> Arc<Self> {
        Arc::new(Self {
            id,
            sender,
            close_request: Mutex::new(None),
            close_notify: Notify::new(),
            created_at: Instant::now(),
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame, waiting for space in the outbound queue
    pub async fn send(&self, frame: ServerFrame) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.sender
            .send(frame)
            .await
            .map_err(|_| DeliveryError::Closed)
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, frame: ServerFrame) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed);
        }
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Request the connection be closed with `code`
    ///
    /// Returns `false` if a close was already requested; the first request
    /// decides the code the client sees.
    pub fn close(&self, code: CloseCode) -> bool {
        self.close_with(CloseRequest::new(code))
    }

    /// Request the connection be closed with an explicit reason
    pub fn close_with(&self, request: CloseRequest) -> bool {
        {
            let mut slot = self.close_request.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(request);
        }
        self.close_notify.notify_waiters();
        true
    }

    /// The close request, if one was made
    pub fn close_request(&self) -> Option<CloseRequest> {
        self.close_request.lock().clone()
    }

    /// Check if the connection was asked to close or its writer is gone
    pub fn is_closed(&self) -> bool {
        self.close_request.lock().is_some() || self.sender.is_closed()
    }

    /// Wait until a close is requested
    pub async fn closed(&self) -> CloseRequest {
        loop {
            // Register before checking so a concurrent close is not missed
            let notified = self.close_notify.notified();
            if let Some(request) = self.close_request() {
                return request;
            }
            notified.await;
        }
    }

    /// Time since the connection was accepted
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("close_request", &self.close_request())
            .field("age", &self.age())
            .finish()
    }
}
