//! Authorization flow for the Outlook provider.
//!
//! `begin` starts an interactive PKCE grant: it persists the verifier
//! together with the event that triggered it, then opens the
//! authorization URL in the browser. Completion happens later, when the
//! host observes the browser landing on the redirect URI and hands the
//! URL to [`OutlookProvider::handle_navigation`].
//!
//! [`OutlookProvider::handle_navigation`]: super::provider::OutlookProvider::handle_navigation

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use calrelay_core::{EventOutcome, EventRequest, ProviderKind};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::Browser;

use super::config::OutlookConfig;
use super::store::{OutlookStore, PendingEvent};

/// Message shown to the caller when an authorization is started.
pub const AUTH_STARTED_MESSAGE: &str =
    "Outlook sign-in opened in your browser. The event will be created once you finish signing in.";

/// A successful token grant from the authorization server.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    /// The bearer token.
    pub access_token: String,
    /// Lifetime in seconds, when reported.
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Runs the PKCE authorization flow against the Microsoft identity
/// platform.
pub struct Authorizer {
    config: OutlookConfig,
    store: Arc<OutlookStore>,
    browser: Arc<dyn Browser>,
    http: reqwest::Client,
}

impl Authorizer {
    /// Creates an authorizer.
    pub fn new(config: OutlookConfig, store: Arc<OutlookStore>, browser: Arc<dyn Browser>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");
        Self {
            config,
            store,
            browser,
            http,
        }
    }

    /// Starts an authorization for an event that could not be created.
    ///
    /// The verifier and the queued event are persisted in one write
    /// before the browser opens, so a crash between the two cannot lose
    /// the event.
    pub fn begin(&self, event: EventRequest) -> EventOutcome {
        let pair = super::pkce::PkcePair::generate();
        let pending_id = format!("pending_event_{}", Utc::now().timestamp_millis());
        let pending = PendingEvent {
            id: pending_id.clone(),
            event,
        };

        if let Err(e) = self.store.begin_authorization(&pair.verifier, pending) {
            warn!(error = %e, "failed to persist authorization state");
            return EventOutcome::failed(ProviderKind::Outlook, e.message());
        }

        let url = match super::pkce::authorize_url(&self.config, &pair.challenge) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "failed to build authorization URL");
                return EventOutcome::failed(ProviderKind::Outlook, e.message());
            }
        };

        info!(pending_id = %pending_id, "starting Outlook authorization");
        self.browser.open(&url);

        EventOutcome::auth_required(ProviderKind::Outlook, Some(pending_id))
            .with_message(AUTH_STARTED_MESSAGE)
    }

    /// Returns true if the URL is the registered redirect URI.
    ///
    /// Matches on scheme, host, and path; the query string is where the
    /// authorization response lives and is ignored here.
    pub fn matches_redirect(&self, url: &str) -> bool {
        let (Ok(candidate), Ok(expected)) = (Url::parse(url), Url::parse(&self.config.redirect_uri))
        else {
            return false;
        };
        candidate.scheme() == expected.scheme()
            && candidate.host_str() == expected.host_str()
            && candidate.port_or_known_default() == expected.port_or_known_default()
            && candidate.path() == expected.path()
    }

    /// Extracts the authorization code from a redirect URL, if present.
    pub fn authorization_code(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty())
    }

    /// Exchanges an authorization code for a token grant.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> ProviderResult<TokenGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", self.config.scopes.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("code_verifier", verifier),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::network("failed to reach token endpoint").with_source(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TokenErrorBody>()
                .await
                .ok()
                .map(|body| {
                    body.error_description
                        .or(body.error)
                        .unwrap_or_else(|| format!("token endpoint returned {status}"))
                })
                .unwrap_or_else(|| format!("token endpoint returned {status}"));
            return Err(ProviderError::authentication(message));
        }

        response.json::<TokenGrant>().await.map_err(|e| {
            ProviderError::invalid_response("unparseable token response").with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::RecordingBrowser;
    use calrelay_core::EventRequest;
    use tempfile::tempdir;

    fn authorizer(dir: &std::path::Path, browser: Arc<RecordingBrowser>) -> Authorizer {
        let config = OutlookConfig::new().with_state_path(dir.join("state.json"));
        let store = Arc::new(OutlookStore::open(dir.join("state.json")).unwrap());
        Authorizer::new(config, store, browser)
    }

    fn sample_event() -> EventRequest {
        EventRequest::new(ProviderKind::Outlook)
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00")
    }

    #[test]
    fn begin_persists_state_and_opens_browser() {
        let dir = tempdir().unwrap();
        let browser = Arc::new(RecordingBrowser::default());
        let auth = authorizer(dir.path(), browser.clone());

        let outcome = auth.begin(sample_event());

        assert!(outcome.requires_auth);
        assert!(
            outcome
                .pending_event_id
                .as_deref()
                .unwrap()
                .starts_with("pending_event_")
        );

        // Exactly one verifier and one queued event were persisted.
        assert_eq!(auth.store.pending_count(), 1);
        assert!(auth.store.take_verifier().unwrap().is_some());

        let opened = browser.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].contains("code_challenge="));
        assert!(opened[0].contains("prompt=select_account"));
    }

    #[test]
    fn matches_redirect_ignores_query() {
        let dir = tempdir().unwrap();
        let auth = authorizer(dir.path(), Arc::new(RecordingBrowser::default()));

        assert!(auth.matches_redirect(
            "https://login.microsoftonline.com/common/oauth2/nativeclient?code=abc&state=x"
        ));
        assert!(auth.matches_redirect(
            "https://login.microsoftonline.com/common/oauth2/nativeclient"
        ));
        assert!(!auth.matches_redirect("https://login.microsoftonline.com/common/oauth2/v2.0/authorize"));
        assert!(!auth.matches_redirect("https://example.com/common/oauth2/nativeclient"));
        assert!(!auth.matches_redirect("not a url"));
    }

    #[test]
    fn authorization_code_extraction() {
        assert_eq!(
            Authorizer::authorization_code("https://x.test/cb?code=abc123&session_state=s"),
            Some("abc123".to_string())
        );
        assert_eq!(
            Authorizer::authorization_code("https://x.test/cb?error=access_denied"),
            None
        );
        assert_eq!(Authorizer::authorization_code("https://x.test/cb?code="), None);
    }
}
