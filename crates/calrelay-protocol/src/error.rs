//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message exceeds the maximum allowed line length.
    #[error("message too large: {size} bytes (max: {max})")]
    LineTooLong { size: usize, max: usize },

    /// Failed to serialize or deserialize a message.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty line where a message was expected.
    #[error("empty message")]
    EmptyMessage,

    /// Message declared an unsupported protocol version.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),
}
