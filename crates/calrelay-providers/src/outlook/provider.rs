//! [`CalendarProvider`] implementation for Outlook, with the redirect
//! interception and pending-event replay that complete its PKCE flow.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use calrelay_core::{EventOutcome, EventRequest, ProviderKind};

use crate::error::ProviderResult;
use crate::provider::{BoxFuture, Browser, CalendarProvider, Navigation, Notifier};

use super::auth::Authorizer;
use super::backend::BackendClient;
use super::config::OutlookConfig;
use super::store::{DEFAULT_TOKEN_LIFETIME_SECS, OutlookStore};

/// Outlook calendar backend.
///
/// Holds the persistent store shared with the [`Authorizer`]; the host
/// routes observed navigations into [`handle_navigation`] to finish
/// in-flight authorizations.
///
/// [`handle_navigation`]: OutlookProvider::handle_navigation
pub struct OutlookProvider {
    store: Arc<OutlookStore>,
    authorizer: Authorizer,
    backend: BackendClient,
    browser: Arc<dyn Browser>,
    notifier: Arc<dyn Notifier>,
}

impl OutlookProvider {
    /// Creates a provider from a configuration and its collaborators.
    pub fn new(
        config: OutlookConfig,
        browser: Arc<dyn Browser>,
        notifier: Arc<dyn Notifier>,
    ) -> ProviderResult<Self> {
        config.validate()?;
        let store = Arc::new(OutlookStore::open(&config.state_path)?);
        let authorizer = Authorizer::new(config.clone(), store.clone(), browser.clone());
        let backend = BackendClient::new(config);
        Ok(Self {
            store,
            authorizer,
            backend,
            browser,
            notifier,
        })
    }

    /// The shared state store, for status reporting.
    pub fn store(&self) -> &Arc<OutlookStore> {
        &self.store
    }

    async fn attempt(&self, event: EventRequest) -> EventOutcome {
        if let Err(message) = event.validate() {
            return EventOutcome::failed(ProviderKind::Outlook, message);
        }

        let token = match self.store.read_token() {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "state store is unusable");
                return EventOutcome::failed(ProviderKind::Outlook, e.message());
            }
        };

        let Some(token) = token else {
            return self.authorizer.begin(event);
        };

        match self.backend.create_event(&token, &event).await {
            Ok(created) => {
                info!(event_id = ?created.id, "Outlook event created");
                self.notifier.notify(
                    "Event created",
                    &format!("\"{}\" added to Outlook Calendar", event.summary_or_default()),
                );
                let link = created.event_link().map(str::to_string);
                EventOutcome::created(ProviderKind::Outlook, created.id, link)
            }
            Err(e) if e.requires_auth() => {
                // The stored token was refused upstream. Drop it so the
                // next attempt starts a fresh authorization.
                warn!(error = %e, "backend rejected the stored token");
                if let Err(clear_err) = self.store.clear_token() {
                    error!(error = %clear_err, "failed to clear rejected token");
                }
                EventOutcome::auth_required(ProviderKind::Outlook, None).with_error(e.message())
            }
            Err(e) => {
                warn!(error = %e, "Outlook event creation failed");
                EventOutcome::failed(ProviderKind::Outlook, e.message())
            }
        }
    }

    /// Replays every queued event, oldest first.
    ///
    /// Each entry is deleted right after its own attempt, whether the
    /// attempt succeeded or not; a failing entry never blocks the rest
    /// of the queue. Returns the number of entries attempted.
    pub async fn replay_pending(&self) -> usize {
        let ids = self.store.pending_ids();
        if ids.is_empty() {
            return 0;
        }
        info!(count = ids.len(), "replaying pending events");

        let mut attempted = 0;
        for id in ids {
            let Some(pending) = self.store.pending_event(&id) else {
                continue;
            };

            let outcome = self.attempt(pending.event).await;
            if outcome.success {
                info!(pending_id = %id, "replayed pending event");
            } else {
                warn!(pending_id = %id, error = ?outcome.error, "pending event replay failed");
            }

            if let Err(e) = self.store.remove_pending(&id) {
                error!(pending_id = %id, error = %e, "failed to delete replayed entry");
            }
            attempted += 1;
        }
        attempted
    }

    /// Inspects a navigation and, when it is the authorization redirect,
    /// completes the flow: exchange the code, store the token, close the
    /// tab, notify, and replay the queue.
    ///
    /// Returns true when the navigation was consumed. Failures past the
    /// match are logged and notified, never raised.
    pub async fn handle_navigation(&self, nav: &Navigation) -> bool {
        if !self.authorizer.matches_redirect(&nav.url) {
            return false;
        }
        let Some(code) = Authorizer::authorization_code(&nav.url) else {
            debug!("redirect navigation without an authorization code, ignoring");
            return false;
        };

        let verifier = match self.store.take_verifier() {
            Ok(Some(verifier)) => verifier,
            Ok(None) => {
                error!("authorization redirect arrived with no stored verifier");
                self.notifier.notify(
                    "Outlook sign-in failed",
                    "No sign-in was in progress. Please try creating the event again.",
                );
                return true;
            }
            Err(e) => {
                error!(error = %e, "failed to load verifier");
                return true;
            }
        };

        match self.authorizer.exchange_code(&code, &verifier).await {
            Ok(grant) => {
                let lifetime = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
                if let Err(e) = self.store.write_token(grant.access_token, lifetime) {
                    error!(error = %e, "failed to store token");
                    return true;
                }
                if let Some(tab) = nav.tab {
                    self.browser.close(tab);
                }
                self.notifier
                    .notify("Outlook connected", "Sign-in complete. Creating queued events.");
                self.replay_pending().await;
            }
            Err(e) => {
                warn!(error = %e, "code exchange failed");
                self.notifier.notify("Outlook sign-in failed", e.message());
            }
        }
        true
    }
}

impl CalendarProvider for OutlookProvider {
    fn name(&self) -> &str {
        "outlook"
    }

    fn create_event(&self, event: EventRequest) -> BoxFuture<'_, EventOutcome> {
        Box::pin(self.attempt(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TabHandle;
    use crate::provider::testing::{RecordingBrowser, RecordingNotifier};
    use super::super::store::PendingEvent;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serves a fixed sequence of HTTP responses on a local port.
    async fn serve_responses(responses: Vec<(u16, String)>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    struct Fixture {
        provider: OutlookProvider,
        browser: Arc<RecordingBrowser>,
        notifier: Arc<RecordingNotifier>,
        _dir: tempfile::TempDir,
    }

    fn fixture(configure: impl FnOnce(OutlookConfig) -> OutlookConfig) -> Fixture {
        let dir = tempdir().unwrap();
        let browser = Arc::new(RecordingBrowser::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let config = configure(
            OutlookConfig::new().with_state_path(dir.path().join("state.json")),
        );
        let provider =
            OutlookProvider::new(config, browser.clone(), notifier.clone()).unwrap();
        Fixture {
            provider,
            browser,
            notifier,
            _dir: dir,
        }
    }

    fn sample_event() -> EventRequest {
        EventRequest::new(ProviderKind::Outlook)
            .with_summary("Standup")
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00")
    }

    #[tokio::test]
    async fn missing_token_starts_authorization() {
        let f = fixture(|c| c);

        let outcome = f.provider.create_event(sample_event()).await;

        assert!(outcome.requires_auth);
        assert!(outcome.pending_event_id.is_some());
        assert_eq!(f.provider.store().pending_count(), 1);
        assert_eq!(f.browser.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn valid_token_creates_event_through_backend() {
        let base = serve_responses(vec![(
            200,
            r#"{"id":"evt1","webLink":"https://outlook.test/evt1"}"#.to_string(),
        )])
        .await;
        let f = fixture(|c| c.with_backend_base(base));
        f.provider.store().write_token("tok_abc", 3600).unwrap();

        let outcome = f.provider.create_event(sample_event()).await;

        assert!(outcome.success);
        assert_eq!(outcome.link.as_deref(), Some("https://outlook.test/evt1"));
        assert_eq!(f.notifier.fired.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn backend_401_clears_token_and_requires_auth() {
        let base = serve_responses(vec![(401, r#"{"error":"unauthorized"}"#.to_string())]).await;
        let f = fixture(|c| c.with_backend_base(base));
        f.provider.store().write_token("tok_stale", 3600).unwrap();

        let outcome = f.provider.create_event(sample_event()).await;

        assert!(!outcome.success);
        assert!(outcome.requires_auth);
        assert!(outcome.error.unwrap().contains("session expired"));
        assert!(!f.provider.store().has_valid_token());
    }

    #[tokio::test]
    async fn replay_attempts_every_entry_and_drains_the_queue() {
        // Second entry fails at the backend; replay continues regardless.
        let base = serve_responses(vec![
            (200, r#"{"id":"evt1"}"#.to_string()),
            (500, r#"{}"#.to_string()),
            (200, r#"{"id":"evt3"}"#.to_string()),
        ])
        .await;
        let f = fixture(|c| c.with_backend_base(base));
        f.provider.store().write_token("tok_abc", 3600).unwrap();
        for id in ["pending_event_1", "pending_event_2", "pending_event_3"] {
            f.provider
                .store()
                .push_pending(PendingEvent {
                    id: id.to_string(),
                    event: sample_event(),
                })
                .unwrap();
        }

        let attempted = f.provider.replay_pending().await;

        assert_eq!(attempted, 3);
        assert_eq!(f.provider.store().pending_count(), 0);
    }

    #[tokio::test]
    async fn replay_with_empty_queue_is_a_no_op() {
        let f = fixture(|c| c);
        assert_eq!(f.provider.replay_pending().await, 0);
    }

    #[tokio::test]
    async fn navigation_to_unrelated_url_is_ignored() {
        let f = fixture(|c| c);
        let nav = Navigation::untracked("https://example.com/?code=abc");
        assert!(!f.provider.handle_navigation(&nav).await);
    }

    #[tokio::test]
    async fn redirect_without_code_is_not_intercepted() {
        let f = fixture(|c| c);
        f.provider
            .store()
            .begin_authorization(
                "ver",
                PendingEvent {
                    id: "pending_event_1".to_string(),
                    event: sample_event(),
                },
            )
            .unwrap();

        let nav = Navigation::untracked(
            "https://login.microsoftonline.com/common/oauth2/nativeclient?error=access_denied",
        );
        assert!(!f.provider.handle_navigation(&nav).await);
        // No exchange happened; the verifier is still armed.
        assert!(f.provider.store().take_verifier().unwrap().is_some());
    }

    #[tokio::test]
    async fn redirect_completes_flow_and_replays_queue() {
        // First response is the token exchange, second the replayed event.
        let base = serve_responses(vec![
            (
                200,
                r#"{"access_token":"tok_new","expires_in":3600}"#.to_string(),
            ),
            (200, r#"{"id":"evt1","webLink":"https://outlook.test/evt1"}"#.to_string()),
        ])
        .await;
        let f = fixture(|c| {
            let token_url = format!("{base}/token");
            c.with_backend_base(base).with_token_url(token_url)
        });
        f.provider
            .store()
            .begin_authorization(
                "ver_abc",
                PendingEvent {
                    id: "pending_event_1".to_string(),
                    event: sample_event(),
                },
            )
            .unwrap();

        let nav = Navigation {
            tab: Some(TabHandle(7)),
            url: "https://login.microsoftonline.com/common/oauth2/nativeclient?code=code_abc"
                .to_string(),
        };
        assert!(f.provider.handle_navigation(&nav).await);

        assert!(f.provider.store().has_valid_token());
        assert_eq!(f.provider.store().pending_count(), 0);
        assert_eq!(
            f.browser.closed.lock().unwrap().as_slice(),
            &[TabHandle(7)]
        );
        // One connection notification plus one created-event notification.
        let fired = f.notifier.fired.lock().unwrap();
        assert_eq!(
            fired
                .iter()
                .filter(|(title, _)| title == "Outlook connected")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn redirect_with_no_stored_verifier_is_consumed_and_notified() {
        let f = fixture(|c| c);
        let nav = Navigation::untracked(
            "https://login.microsoftonline.com/common/oauth2/nativeclient?code=abc",
        );

        assert!(f.provider.handle_navigation(&nav).await);

        let fired = f.notifier.fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert!(fired[0].0.contains("failed"));
    }
}
