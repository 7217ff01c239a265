//! Error types shared across the crate.

use crate::sync::ConnectionId;
use thiserror::Error;

/// Failure to read or write the durable copy of the notepad.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// An inbound message the engine refused to apply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("non-text payload of {len} bytes")]
    NonTextPayload { len: usize },

    /// The sender was closed or evicted before its message was applied.
    #[error("{connection} is not registered")]
    UnknownConnection { connection: ConnectionId },
}
