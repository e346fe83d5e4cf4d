//! Per-connection session loop.
//!
//! A [`SessionOrchestrator`] owns one transport and processes its messages
//! strictly one at a time:
//!
//! ```text
//! Idle --recv--> Processing --send--> Idle
//!   \                 \
//!    +--disconnect-----+--transport error--> Closed
//! ```
//!
//! Each exchange runs in its own task so that a panic inside it becomes an
//! error envelope instead of taking the connection down. Only errors that
//! [`askdb_core::error::AskDbError::is_fatal_to_session`] marks as fatal end the session, and
//! the transport is always closed on exit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use askdb_core::error::Result;

use crate::error::ChatError;
use crate::pipeline::{read_frame, ExchangePipeline};
use crate::types::{ExchangeData, ResponseEnvelope};

/// A bidirectional text channel bound to one client.
#[async_trait]
pub trait MessageTransport: Send {
    /// Next inbound text frame, or `Ok(None)` once the peer has gone away.
    async fn recv(&mut self) -> Result<Option<String>>;

    async fn send(&mut self, text: String) -> Result<()>;

    /// Shut the channel down. Must be safe to call on a broken channel.
    async fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Processing,
    Closed,
}

pub struct SessionOrchestrator<T: MessageTransport> {
    id: Uuid,
    state: SessionState,
    transport: T,
    pipeline: Arc<ExchangePipeline>,
    exchanges: u64,
}

impl<T: MessageTransport> SessionOrchestrator<T> {
    pub fn new(transport: T, pipeline: Arc<ExchangePipeline>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            transport,
            pipeline,
            exchanges: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of responses sent so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Serve the connection until the peer disconnects or the channel fails.
    pub async fn run(&mut self) {
        info!(session_id = %self.id, "Session opened");

        while self.state != SessionState::Closed {
            self.state = SessionState::Idle;
            let text = match self.transport.recv().await {
                Ok(Some(text)) => text,
                Ok(None) => {
                    debug!(session_id = %self.id, "Peer disconnected");
                    break;
                }
                Err(e) if e.is_fatal_to_session() => {
                    warn!(session_id = %self.id, error = %e, "Transport receive failed");
                    break;
                }
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Receive error, session continues");
                    continue;
                }
            };

            self.state = SessionState::Processing;
            let envelope = process_frame(self.id, &self.pipeline, text).await;

            match self.transport.send(envelope.to_json()).await {
                Ok(()) => self.exchanges += 1,
                Err(e) if e.is_fatal_to_session() => {
                    warn!(session_id = %self.id, error = %e, "Transport send failed");
                    break;
                }
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Response dropped, session continues")
                }
            }
        }

        self.state = SessionState::Closed;
        self.transport.close().await;
        info!(session_id = %self.id, exchanges = self.exchanges, "Session closed");
    }
}

/// Run one frame through the pipeline on its own task.
async fn process_frame(
    session_id: Uuid,
    pipeline: &Arc<ExchangePipeline>,
    text: String,
) -> ResponseEnvelope {
    let inbound = match read_frame(&text) {
        Ok(inbound) => inbound,
        Err(rejected) => {
            debug!(session_id = %session_id, "Malformed frame answered with error envelope");
            return rejected;
        }
    };

    let echo = ExchangeData {
        message: inbound.message.clone(),
        mode: inbound.mode.clone(),
        ..ExchangeData::default()
    };
    let pipeline = Arc::clone(pipeline);
    let task = tokio::spawn(async move { pipeline.handle_message(inbound).await });

    match task.await {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Exchange task aborted");
            let reason = if e.is_panic() {
                "internal error while processing message"
            } else {
                "exchange was cancelled"
            };
            ResponseEnvelope::error(echo, ChatError::Aborted(reason.to_string()).to_string())
        }
    }
}
