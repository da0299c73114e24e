//! WebSocket chat client for tests

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use lingua_core::ChatMessage;
use lingua_gateway::protocol::ServerFrame;
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long to wait for an expected frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A chat participant
pub struct ChatClient {
    socket: Socket,
    /// Nickname from the `user_info` greeting
    pub username: Option<String>,
    /// Messages from the `message_history` greeting
    pub history: Vec<ChatMessage>,
}

impl ChatClient {
    /// Open a socket to the chat endpoint
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = connect_async(url).await.context("WebSocket handshake failed")?;
        Ok(Self {
            socket,
            username: None,
            history: Vec::new(),
        })
    }

    /// Read `user_info` then `message_history`
    pub async fn read_greeting(&mut self) -> Result<()> {
        match self.next_frame().await? {
            ServerFrame::UserInfo { username } => self.username = Some(username),
            other => bail!("expected user_info, got {other:?}"),
        }
        match self.next_frame().await? {
            ServerFrame::MessageHistory { messages } => self.history = messages,
            other => bail!("expected message_history, got {other:?}"),
        }
        Ok(())
    }

    /// Send a chat message
    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.send_raw(Message::Text(json!({ "text": text }).to_string()))
            .await
    }

    /// Send any WebSocket message
    pub async fn send_raw(&mut self, message: Message) -> Result<()> {
        self.socket.send(message).await?;
        Ok(())
    }

    /// Next JSON frame, skipping keepalives
    pub async fn next_frame(&mut self) -> Result<ServerFrame> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.socket.next())
                .await
                .context("timed out waiting for a frame")?;

            match message {
                Some(Ok(Message::Text(text))) => return Ok(ServerFrame::from_json(&text)?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(frame))) => bail!("socket closed: {frame:?}"),
                Some(Ok(other)) => bail!("unexpected message {other:?}"),
                Some(Err(e)) => return Err(e.into()),
                None => bail!("socket ended"),
            }
        }
    }

    /// Next frame, which must be a relayed chat message
    pub async fn expect_message(&mut self) -> Result<ChatMessage> {
        match self.next_frame().await? {
            ServerFrame::NewMessage { message } => Ok(message),
            other => bail!("expected new_message, got {other:?}"),
        }
    }

    /// Read until the server closes; returns the close code
    ///
    /// Frames received before the close are skipped.
    pub async fn expect_close(&mut self) -> Result<u16> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.socket.next())
                .await
                .context("timed out waiting for close")?;

            match message {
                Some(Ok(Message::Close(Some(frame)))) => return Ok(u16::from(frame.code)),
                Some(Ok(Message::Close(None))) => bail!("close frame without a code"),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => bail!("socket ended without a close frame"),
            }
        }
    }

    /// Assert nothing but keepalives arrive for `duration`
    pub async fn expect_silence(&mut self, duration: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            match tokio::time::timeout_at(deadline, self.socket.next()).await {
                Err(_) => return Ok(()),
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
                Ok(other) => bail!("expected silence, got {other:?}"),
            }
        }
    }

    /// Close the socket from the client side
    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await?;
        Ok(())
    }
}
