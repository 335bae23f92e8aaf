//! Outlook provider configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Public application (client) id registered with the Microsoft
/// identity platform. Safe to embed: the PKCE flow carries no secret.
pub const DEFAULT_CLIENT_ID: &str = "c12019d0-653a-4ba8-b179-507b9314c95d";

/// Authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str =
    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize";

/// Token endpoint for the code exchange.
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Fixed redirect URI the authorization server sends the code back to.
pub const DEFAULT_REDIRECT_URI: &str =
    "https://login.microsoftonline.com/common/oauth2/nativeclient";

/// Scopes requested during authorization.
pub const DEFAULT_SCOPES: &str = "https://graph.microsoft.com/Calendars.ReadWrite offline_access";

/// Base URL of the local event backend.
pub const DEFAULT_BACKEND_BASE: &str = "http://127.0.0.1:5000";

/// Default HTTP timeout for token and backend calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Outlook provider.
#[derive(Debug, Clone)]
pub struct OutlookConfig {
    /// OAuth client id.
    pub client_id: String,
    /// Authorization endpoint.
    pub authorize_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Redirect URI registered for the client.
    pub redirect_uri: String,
    /// Space-separated scope list.
    pub scopes: String,
    /// Base URL of the local event backend.
    pub backend_base: String,
    /// Location of the persistent state file.
    pub state_path: PathBuf,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for OutlookConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
            backend_base: DEFAULT_BACKEND_BASE.to_string(),
            state_path: default_state_path(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OutlookConfig {
    /// Creates a configuration with default endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: override the OAuth client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Builder: override the token endpoint. Used by tests.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Builder: override the backend base URL.
    pub fn with_backend_base(mut self, backend_base: impl Into<String>) -> Self {
        self.backend_base = backend_base.into();
        self
    }

    /// Builder: override the state file location.
    pub fn with_state_path(mut self, state_path: impl Into<PathBuf>) -> Self {
        self.state_path = state_path.into();
        self
    }

    /// Builder: override the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that required fields are present.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ProviderError::configuration("client_id must not be empty"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ProviderError::configuration(
                "redirect_uri must not be empty",
            ));
        }
        Ok(())
    }

    /// Returns the backend endpoint for event creation.
    pub fn create_event_url(&self) -> String {
        format!(
            "{}/create-outlook-event",
            self.backend_base.trim_end_matches('/')
        )
    }
}

/// Default location of the Outlook state file.
///
/// Uses the XDG data directory when available, with a dotfile fallback.
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("calrelay").join("outlook-state.json"))
        .unwrap_or_else(|| PathBuf::from(".calrelay-outlook-state.json"))
}
