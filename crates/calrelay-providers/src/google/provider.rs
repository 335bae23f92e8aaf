//! [`CalendarProvider`] implementation for Google Calendar.

use std::sync::Arc;

use tracing::{info, warn};

use calrelay_core::{EventOutcome, EventRequest, ProviderKind};

use crate::provider::{BoxFuture, CalendarProvider, Notifier};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::token::TokenSource;

/// Google Calendar backend.
pub struct GoogleProvider {
    client: GoogleCalendarClient,
    tokens: Arc<dyn TokenSource>,
    notifier: Arc<dyn Notifier>,
}

impl GoogleProvider {
    /// Creates a provider from a configuration and its collaborators.
    pub fn new(
        config: GoogleConfig,
        tokens: Arc<dyn TokenSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client: GoogleCalendarClient::new(config),
            tokens,
            notifier,
        }
    }

    async fn attempt(&self, event: EventRequest) -> EventOutcome {
        if let Err(message) = event.validate() {
            return EventOutcome::failed(ProviderKind::Google, message);
        }

        let token = match self.tokens.access_token() {
            Ok(token) => token,
            Err(e) if e.requires_auth() => {
                warn!(error = %e, "no Google credential available");
                return EventOutcome::auth_required(ProviderKind::Google, None)
                    .with_error(e.message());
            }
            Err(e) => {
                warn!(error = %e, "failed to obtain Google credential");
                return EventOutcome::failed(ProviderKind::Google, e.message());
            }
        };

        match self.client.insert_event(&token, &event).await {
            Ok(created) => {
                info!(event_id = ?created.id, "Google event created");
                self.notifier.notify(
                    "Event created",
                    &format!("\"{}\" added to Google Calendar", event.summary_or_default()),
                );
                EventOutcome::created(ProviderKind::Google, created.id, created.html_link)
            }
            Err(e) if e.requires_auth() => {
                warn!(error = %e, "Google rejected the stored credential");
                EventOutcome::auth_required(ProviderKind::Google, None).with_error(e.message())
            }
            Err(e) => {
                warn!(error = %e, "Google event creation failed");
                EventOutcome::failed(ProviderKind::Google, e.message())
            }
        }
    }
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn create_event(&self, event: EventRequest) -> BoxFuture<'_, EventOutcome> {
        Box::pin(self.attempt(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::testing::RecordingNotifier;

    struct FailingTokens;

    impl TokenSource for FailingTokens {
        fn access_token(&self) -> crate::ProviderResult<String> {
            Err(ProviderError::auth_required("no token"))
        }
    }

    fn provider(notifier: Arc<RecordingNotifier>) -> GoogleProvider {
        GoogleProvider::new(GoogleConfig::default(), Arc::new(FailingTokens), notifier)
    }

    #[tokio::test]
    async fn missing_token_reports_requires_auth() {
        let notifier = Arc::new(RecordingNotifier::default());
        let provider = provider(notifier.clone());

        let event = EventRequest::new(ProviderKind::Google)
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00");
        let outcome = provider.create_event(event).await;

        assert!(!outcome.success);
        assert!(outcome.requires_auth);
        assert!(notifier.fired.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_event_fails_before_token_lookup() {
        let notifier = Arc::new(RecordingNotifier::default());
        let provider = provider(notifier);

        let outcome = provider
            .create_event(EventRequest::new(ProviderKind::Google))
            .await;

        assert!(!outcome.success);
        assert!(!outcome.requires_auth);
        assert!(outcome.error.unwrap().contains("start or end time"));
    }

    #[test]
    fn provider_name() {
        let notifier = Arc::new(RecordingNotifier::default());
        assert_eq!(provider(notifier).name(), "google");
    }
}
