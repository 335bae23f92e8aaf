//! Agent error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or running the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Another agent already owns the socket.
    #[error("socket {0} is already in use by a running agent")]
    SocketInUse(PathBuf),

    /// Socket or filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire protocol failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] calrelay_protocol::ProtocolError),

    /// Provider setup failed.
    #[error("provider error: {0}")]
    Provider(#[from] calrelay_providers::ProviderError),

    /// Tracing initialization failed.
    #[error("tracing error: {0}")]
    Tracing(#[from] calrelay_core::TracingError),
}

/// A specialized Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
