//! Error types for the session protocol.

use askdb_core::error::AskDbError;

/// Errors that end a single exchange.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("exchange aborted: {0}")]
    Aborted(String),
    #[error(transparent)]
    Pipeline(#[from] AskDbError),
}
