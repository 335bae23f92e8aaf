//! Bearer token acquisition for the Google provider.
//!
//! The Google side of this system relies on an externally managed
//! identity: the host hands the provider a bearer token rather than
//! running an interactive grant. [`TokenSource`] is the seam.

use std::env;

use crate::error::{ProviderError, ProviderResult};

/// Supplies an OAuth bearer token for Google API calls.
pub trait TokenSource: Send + Sync {
    /// Returns a currently valid access token.
    fn access_token(&self) -> ProviderResult<String>;
}

/// Token source backed by a fixed string. Mostly for tests.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wraps the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenSource for StaticTokenSource {
    fn access_token(&self) -> ProviderResult<String> {
        Ok(self.token.clone())
    }
}

/// Environment variable holding the Google access token.
pub const GOOGLE_TOKEN_ENV: &str = "CALRELAY_GOOGLE_TOKEN";

/// Token source that reads [`GOOGLE_TOKEN_ENV`] on every call, so a
/// refreshed token is picked up without restarting the agent.
#[derive(Debug, Clone, Default)]
pub struct EnvTokenSource;

impl TokenSource for EnvTokenSource {
    fn access_token(&self) -> ProviderResult<String> {
        match env::var(GOOGLE_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ProviderError::auth_required(format!(
                "no Google access token available, set {GOOGLE_TOKEN_ENV}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_returns_token() {
        let source = StaticTokenSource::new("ya29.abc");
        assert_eq!(source.access_token().unwrap(), "ya29.abc");
    }

    #[test]
    fn env_source_missing_requires_auth() {
        // The variable is not set in the test environment.
        let source = EnvTokenSource;
        if env::var(GOOGLE_TOKEN_ENV).is_err() {
            let err = source.access_token().unwrap_err();
            assert!(err.requires_auth());
        }
    }
}
