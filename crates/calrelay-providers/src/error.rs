//! Error types for calendar provider operations.
//!
//! Providers mostly convert these into structured [`EventOutcome`]s at the
//! trait boundary; the error type still carries a code taxonomy so callers
//! that stay inside the crate can branch on the failure class, in
//! particular on "authentication required".
//!
//! [`EventOutcome`]: calrelay_core::EventOutcome

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// No valid credential exists; the caller must authenticate and retry.
    AuthenticationRequired,
    /// Authentication was attempted and failed.
    AuthenticationFailed,
    /// The request was rejected before any network call.
    ValidationFailed,
    /// Network error - connection failed, timeout, DNS resolution.
    NetworkError,
    /// The local backend or remote provider reported an error.
    BackendError,
    /// Unparseable or unexpected response from a remote endpoint.
    InvalidResponse,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// The persistent local store failed; not recoverable.
    StorageError,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns a short name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::AuthenticationFailed => "authentication_failed",
            Self::ValidationFailed => "validation_failed",
            Self::NetworkError => "network_error",
            Self::BackendError => "backend_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::StorageError => "storage_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while interacting with a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ProviderErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication-required error.
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationRequired, message)
    }

    /// Creates an authentication-failed error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ValidationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BackendError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::StorageError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the caller should authenticate and retry.
    pub fn requires_auth(&self) -> bool {
        self.code == ProviderErrorCode::AuthenticationRequired
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
