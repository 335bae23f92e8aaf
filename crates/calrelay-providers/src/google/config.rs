//! Google Calendar API configuration.

use std::time::Duration;

/// Default base URL for the Google Calendar v3 API.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default HTTP timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Google Calendar client.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Base URL of the Calendar API.
    pub api_base: String,
    /// Calendar to insert events into.
    pub calendar_id: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            calendar_id: "primary".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GoogleConfig {
    /// Creates a configuration with default endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: override the API base URL. Used by tests to point the
    /// client at a local server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Builder: target a calendar other than `primary`.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Builder: override the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the URL for inserting an event into the configured calendar.
    pub fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_events_url() {
        let config = GoogleConfig::default();
        assert_eq!(
            config.events_url(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
    }

    #[test]
    fn custom_calendar_is_encoded() {
        let config = GoogleConfig::new()
            .with_api_base("http://127.0.0.1:9999/")
            .with_calendar_id("team calendar@example.com");
        assert_eq!(
            config.events_url(),
            "http://127.0.0.1:9999/calendars/team%20calendar%40example.com/events"
        );
    }
}
