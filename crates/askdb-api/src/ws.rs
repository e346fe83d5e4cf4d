//! Websocket adapter for the session transport.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use tracing::debug;

use askdb_chat::MessageTransport;
use askdb_core::error::{AskDbError, Result};

pub struct WsTransport {
    socket: WebSocket,
    closed: bool,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self {
            socket,
            closed: false,
        }
    }
}

#[async_trait]
impl MessageTransport for WsTransport {
    async fn recv(&mut self) -> Result<Option<String>> {
        loop {
            match self.socket.recv().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(AskDbError::Transport(e.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(_))) => {
                    self.closed = true;
                    return Ok(None);
                }
                // Pings are answered by the protocol layer.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<()> {
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| AskDbError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.socket.send(Message::Close(None)).await {
            debug!(error = %e, "Close frame not delivered");
        }
    }
}
