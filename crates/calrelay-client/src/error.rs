//! Client error types.

use thiserror::Error;

/// Errors raised by the CLI.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the agent socket.
    #[error("cannot connect to the agent at {path}: {source}")]
    Connect {
        /// Socket path that was tried.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Wire protocol failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] calrelay_protocol::ProtocolError),

    /// The agent closed the connection before replying.
    #[error("agent closed the connection without a reply")]
    NoReply,

    /// The reply did not correlate with the request.
    #[error("mismatched reply: expected request id {expected}, got {actual}")]
    MismatchedReply {
        /// Request id that was sent.
        expected: String,
        /// Request id that came back.
        actual: String,
    },

    /// The agent reported an error.
    #[error("{0}")]
    Agent(#[from] calrelay_protocol::ErrorResponse),
}

/// A specialized Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
