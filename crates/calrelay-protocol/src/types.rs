//! Request and response types for the calrelay protocol.

use calrelay_core::{EventOutcome, EventRequest};
use serde::{Deserialize, Serialize};

use crate::PROTOCOL_VERSION;

/// Message envelope wrapping all protocol messages.
///
/// Provides versioning and request/response correlation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Protocol version (always "1" for v1).
    pub protocol_version: String,
    /// Unique request id for correlation.
    pub request_id: String,
    /// The actual payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope with the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    /// Creates a request envelope.
    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    /// Creates a response envelope.
    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Checks if this envelope uses a compatible protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// Requests sent from the CLI to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Create a calendar event with the given payload.
    CreateCalendarEvent {
        /// The event to create; `event.provider` selects the backend.
        #[serde(rename = "eventData")]
        event_data: EventRequest,
    },

    /// Complete a pending authorization by submitting the redirect URL
    /// the browser landed on.
    CompleteAuthorization {
        /// Full redirect URL including the query string.
        redirect_url: String,
    },

    /// Replay all persisted pending events.
    ReplayPending,

    /// Get agent status.
    Status,

    /// Ping to check agent liveness.
    Ping,

    /// Request agent shutdown.
    Shutdown,
}

impl Request {
    /// Creates a CreateCalendarEvent request.
    pub fn create_event(event_data: EventRequest) -> Self {
        Self::CreateCalendarEvent { event_data }
    }

    /// Creates a CompleteAuthorization request.
    pub fn complete_authorization(redirect_url: impl Into<String>) -> Self {
        Self::CompleteAuthorization {
            redirect_url: redirect_url.into(),
        }
    }
}

/// Responses sent from the agent to the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Result of an event-creation attempt.
    EventResult {
        /// The structured outcome.
        #[serde(flatten)]
        outcome: EventOutcome,
    },

    /// Result of a replay sweep.
    Replayed {
        /// Number of pending events attempted.
        attempted: usize,
    },

    /// Agent status information.
    Status {
        /// Status details.
        #[serde(flatten)]
        info: StatusInfo,
    },

    /// Generic success response.
    Ok,

    /// Pong response to Ping.
    Pong,

    /// Error response.
    Error {
        /// Error details.
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl Response {
    /// Creates an EventResult response.
    pub fn event_result(outcome: EventOutcome) -> Self {
        Self::EventResult { outcome }
    }

    /// Creates a Replayed response.
    pub fn replayed(attempted: usize) -> Self {
        Self::Replayed { attempted }
    }

    /// Creates a Status response.
    pub fn status(info: StatusInfo) -> Self {
        Self::Status { info }
    }

    /// Creates an Error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    /// Returns true unless this is an error response.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// Returns the error if this is an error response.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Agent status information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Agent uptime in seconds.
    pub uptime_seconds: u64,

    /// Names of the configured providers.
    pub providers: Vec<String>,

    /// Number of persisted pending events awaiting replay.
    pub pending_events: usize,

    /// Whether a valid Outlook token is currently stored.
    pub outlook_authenticated: bool,
}

impl StatusInfo {
    /// Creates a new StatusInfo with no providers.
    pub fn new(uptime_seconds: u64) -> Self {
        Self {
            uptime_seconds,
            providers: Vec::new(),
            pending_events: 0,
            outlook_authenticated: false,
        }
    }

    /// Builder: add a provider name.
    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.providers.push(name.into());
        self
    }

    /// Builder: set the pending-event count.
    pub fn with_pending_events(mut self, count: usize) -> Self {
        self.pending_events = count;
        self
    }

    /// Builder: set the Outlook authentication flag.
    pub fn with_outlook_authenticated(mut self, authenticated: bool) -> Self {
        self.outlook_authenticated = authenticated;
        self
    }
}

/// Error codes for protocol errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown or internal error.
    InternalError,

    /// Invalid request format.
    InvalidRequest,

    /// No provider is configured for the requested backend.
    UnknownProvider,

    /// Provider authentication failed.
    AuthenticationFailed,

    /// Agent is shutting down.
    ShuttingDown,
}

impl ErrorCode {
    /// Returns a human-readable description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InternalError => "An internal error occurred",
            Self::InvalidRequest => "The request was invalid",
            Self::UnknownProvider => "No such provider is configured",
            Self::AuthenticationFailed => "Authentication failed",
            Self::ShuttingDown => "Agent is shutting down",
        }
    }
}

/// Error response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}
