//! Client for the local Outlook event backend.
//!
//! The backend is a small local service that holds the Microsoft Graph
//! integration; this client posts the bearer token and the event
//! payload to it and interprets the result.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use calrelay_core::EventRequest;

use crate::error::{ProviderError, ProviderResult};

use super::config::OutlookConfig;

/// A created event as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendEvent {
    /// Event id assigned by the provider.
    pub id: Option<String>,
    /// Link to the event in the Outlook UI.
    #[serde(rename = "webLink")]
    pub web_link: Option<String>,
    /// Older backends report the link under this name.
    pub link: Option<String>,
}

impl BackendEvent {
    /// The event link, whichever field the backend used.
    pub fn event_link(&self) -> Option<&str> {
        self.web_link.as_deref().or(self.link.as_deref())
    }
}

#[derive(Debug, Serialize)]
struct CreateEventBody<'a> {
    access_token: &'a str,
    event_data: EventData<'a>,
}

#[derive(Debug, Serialize)]
struct EventData<'a> {
    summary: &'a str,
    description: &'a str,
    start_time: &'a str,
    end_time: &'a str,
    attendees: &'a [String],
    #[serde(rename = "timeZone")]
    time_zone: &'a str,
}

/// Builds the backend request body.
///
/// Attendees are forwarded unfiltered; the backend applies its own
/// address validation.
fn create_event_body<'a>(access_token: &'a str, event: &'a EventRequest) -> CreateEventBody<'a> {
    CreateEventBody {
        access_token,
        event_data: EventData {
            summary: event.summary_or_default(),
            description: event.description_or_default(),
            start_time: event.start_time.as_deref().unwrap_or_default(),
            end_time: event.end_time.as_deref().unwrap_or_default(),
            attendees: &event.attendees,
            time_zone: event.time_zone_or_default(),
        },
    }
}

/// HTTP client for the event backend.
pub struct BackendClient {
    config: OutlookConfig,
    http: reqwest::Client,
}

impl BackendClient {
    /// Creates a client for the given configuration.
    pub fn new(config: OutlookConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { config, http }
    }

    /// Asks the backend to create an event with the given credential.
    ///
    /// A 401 from the backend means the token was refused upstream and
    /// surfaces as an authentication-required error.
    pub async fn create_event(
        &self,
        access_token: &str,
        event: &EventRequest,
    ) -> ProviderResult<BackendEvent> {
        let url = self.config.create_event_url();
        debug!(url = %url, "posting event to backend");

        let response = self
            .http
            .post(&url)
            .json(&create_event_body(access_token, event))
            .send()
            .await
            .map_err(|e| ProviderError::network("failed to reach event backend").with_source(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::auth_required(
                "Outlook session expired, please reauthenticate.",
            ));
        }
        if !status.is_success() {
            return Err(ProviderError::backend(format!(
                "Backend error: {}",
                status.as_u16()
            )));
        }

        response.json::<BackendEvent>().await.map_err(|e| {
            ProviderError::invalid_response("unparseable backend response").with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calrelay_core::ProviderKind;

    #[test]
    fn body_uses_backend_field_names() {
        let event = EventRequest::new(ProviderKind::Outlook)
            .with_summary("Review")
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00")
            .with_attendee("alice@example.com")
            .with_attendee("not-an-email");

        let json = serde_json::to_value(create_event_body("tok_abc", &event)).unwrap();

        assert_eq!(json["access_token"], "tok_abc");
        assert_eq!(json["event_data"]["summary"], "Review");
        assert_eq!(json["event_data"]["start_time"], "2025-03-01T10:00:00");
        assert_eq!(json["event_data"]["timeZone"], "America/Chicago");
        // Forwarded as-is, validation happens server side.
        assert_eq!(json["event_data"]["attendees"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn event_link_prefers_web_link() {
        let event: BackendEvent = serde_json::from_str(
            r#"{"id":"evt1","webLink":"https://outlook.test/a","link":"https://outlook.test/b"}"#,
        )
        .unwrap();
        assert_eq!(event.event_link(), Some("https://outlook.test/a"));

        let fallback: BackendEvent =
            serde_json::from_str(r#"{"id":"evt2","link":"https://outlook.test/b"}"#).unwrap();
        assert_eq!(fallback.event_link(), Some("https://outlook.test/b"));
    }
}
