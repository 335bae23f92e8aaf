//! HTTP client for the Google Calendar v3 API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use calrelay_core::EventRequest;

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;

/// A created event as reported by the Calendar API.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEvent {
    /// Event id assigned by Google.
    pub id: Option<String>,
    /// Link to the event in the Calendar UI.
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

/// Wire representation of an event insert request.
#[derive(Debug, Serialize)]
struct ApiEvent<'a> {
    summary: &'a str,
    description: &'a str,
    start: ApiTime<'a>,
    end: ApiTime<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<ApiAttendee<'a>>,
    reminders: ApiReminders,
}

#[derive(Debug, Serialize)]
struct ApiTime<'a> {
    #[serde(rename = "dateTime")]
    date_time: &'a str,
    #[serde(rename = "timeZone")]
    time_zone: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiAttendee<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiReminders {
    #[serde(rename = "useDefault")]
    use_default: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Builds the insert body from a validated request.
///
/// Invalid attendee addresses are dropped rather than rejected; the
/// Calendar API refuses the whole insert otherwise.
fn event_body<'a>(event: &'a EventRequest) -> ApiEvent<'a> {
    let time_zone = event.time_zone_or_default();
    ApiEvent {
        summary: event.summary_or_default(),
        description: event.description_or_default(),
        start: ApiTime {
            date_time: event.start_time.as_deref().unwrap_or_default(),
            time_zone,
        },
        end: ApiTime {
            date_time: event.end_time.as_deref().unwrap_or_default(),
            time_zone,
        },
        attendees: event
            .valid_attendees()
            .into_iter()
            .map(|email| ApiAttendee { email })
            .collect(),
        reminders: ApiReminders { use_default: true },
    }
}

/// Client for inserting events into Google Calendar.
pub struct GoogleCalendarClient {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleCalendarClient {
    /// Creates a client for the given configuration.
    pub fn new(config: GoogleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { config, http }
    }

    /// Inserts an event into the configured calendar.
    pub async fn insert_event(
        &self,
        access_token: &str,
        event: &EventRequest,
    ) -> ProviderResult<CreatedEvent> {
        let url = self.config.events_url();
        debug!(url = %url, "inserting calendar event");

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&event_body(event))
            .send()
            .await
            .map_err(|e| {
                ProviderError::network("failed to reach Google Calendar API").with_source(e)
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::auth_required(
                "Google session expired, provide a fresh access token",
            ));
        }
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| format!("Google API error {status}"));
            return Err(ProviderError::backend(message));
        }

        response.json::<CreatedEvent>().await.map_err(|e| {
            ProviderError::invalid_response("unparseable Calendar API response").with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calrelay_core::ProviderKind;

    fn request() -> EventRequest {
        EventRequest::new(ProviderKind::Google)
            .with_summary("Planning")
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00")
            .with_attendee("alice@example.com")
            .with_attendee("not-an-email")
    }

    #[test]
    fn body_uses_wire_field_names() {
        let event = request();
        let json = serde_json::to_value(event_body(&event)).unwrap();

        assert_eq!(json["summary"], "Planning");
        assert_eq!(json["start"]["dateTime"], "2025-03-01T10:00:00");
        assert_eq!(json["start"]["timeZone"], "America/Chicago");
        assert_eq!(json["reminders"]["useDefault"], true);
    }

    #[test]
    fn body_drops_invalid_attendees() {
        let event = request();
        let json = serde_json::to_value(event_body(&event)).unwrap();

        let attendees = json["attendees"].as_array().unwrap();
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0]["email"], "alice@example.com");
    }

    #[test]
    fn body_omits_empty_attendees() {
        let event = EventRequest::new(ProviderKind::Google)
            .with_times("2025-03-01T10:00:00", "2025-03-01T11:00:00");
        let json = serde_json::to_value(event_body(&event)).unwrap();
        assert!(json.get("attendees").is_none());
    }

    #[test]
    fn created_event_parses_html_link() {
        let created: CreatedEvent = serde_json::from_str(
            r#"{"id":"evt1","htmlLink":"https://calendar.google.com/event?eid=evt1"}"#,
        )
        .unwrap();
        assert_eq!(created.id.as_deref(), Some("evt1"));
        assert!(created.html_link.unwrap().contains("eid=evt1"));
    }
}
