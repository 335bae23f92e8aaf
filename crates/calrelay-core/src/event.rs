//! Calendar event requests and creation outcomes.
//!
//! An [`EventRequest`] is the inbound payload asking for a calendar event to
//! be created; an [`EventOutcome`] is the structured result every creation
//! path returns. Creation never raises past its boundary: failures,
//! validation problems, and "authenticate first, then retry" are all encoded
//! in the outcome.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default IANA time zone applied when a request does not carry one.
pub const DEFAULT_TIME_ZONE: &str = "America/Chicago";

/// Default event title for requests without a summary.
const DEFAULT_SUMMARY: &str = "Meeting from Email Assistant";

/// Default event body for requests without a description.
const DEFAULT_DESCRIPTION: &str = "Created automatically by calrelay";

/// Returns true if the string looks like an email address.
///
/// Intentionally loose: one `@`, no whitespace, a dot in the domain part.
/// Surrounding whitespace is ignored.
pub fn is_valid_email(candidate: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    });
    re.is_match(candidate.trim())
}

/// The calendar backend a request targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Calendar via a delegated identity token.
    Google,
    /// Outlook via the manual PKCE flow and the local backend.
    #[default]
    Outlook,
}

impl ProviderKind {
    /// Returns the provider name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Outlook => "outlook",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "outlook" => Ok(Self::Outlook),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// A request to create a calendar event.
///
/// Start and end times are RFC 3339 strings passed through to the provider
/// APIs unmodified; they are the only mandatory fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    /// Event title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Event body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Event start (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    /// Event end (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    /// IANA time zone for start and end.
    #[serde(
        default,
        rename = "timeZone",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_zone: Option<String>,

    /// Attendee email addresses; invalid entries are dropped, not rejected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,

    /// Target calendar backend.
    #[serde(default)]
    pub provider: ProviderKind,
}

impl EventRequest {
    /// Creates an empty request for the given provider.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Builder: set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: set start and end times.
    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self.end_time = Some(end.into());
        self
    }

    /// Builder: set the time zone.
    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = Some(tz.into());
        self
    }

    /// Builder: add an attendee.
    pub fn with_attendee(mut self, email: impl Into<String>) -> Self {
        self.attendees.push(email.into());
        self
    }

    /// Checks that the request carries the mandatory fields.
    ///
    /// Rejection happens here, before any network call is made.
    pub fn validate(&self) -> Result<(), String> {
        let has_start = self.start_time.as_deref().is_some_and(|s| !s.is_empty());
        let has_end = self.end_time.as_deref().is_some_and(|s| !s.is_empty());
        if !has_start || !has_end {
            return Err("missing start or end time for event".to_string());
        }
        Ok(())
    }

    /// Returns the summary, falling back to the default title.
    pub fn summary_or_default(&self) -> &str {
        self.summary.as_deref().unwrap_or(DEFAULT_SUMMARY)
    }

    /// Returns the description, falling back to the default body.
    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)
    }

    /// Returns the time zone, falling back to [`DEFAULT_TIME_ZONE`].
    pub fn time_zone_or_default(&self) -> &str {
        self.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE)
    }

    /// Returns the attendees that pass email validation.
    pub fn valid_attendees(&self) -> Vec<&str> {
        self.attendees
            .iter()
            .map(String::as_str)
            .filter(|a| is_valid_email(a))
            .collect()
    }
}

/// Structured result of an event-creation attempt.
///
/// Authentication problems are flagged with `requires_auth` so callers can
/// branch without parsing error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Whether the event was created.
    pub success: bool,

    /// The provider that handled the request.
    pub provider: String,

    /// Provider event identifier, on success.
    #[serde(
        default,
        rename = "eventId",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,

    /// Link to the created event, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Error message, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True when the caller must authenticate and retry.
    #[serde(
        default,
        rename = "requiresAuth",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub requires_auth: bool,

    /// Identifier of the persisted pending event, when one was deferred.
    #[serde(
        default,
        rename = "pendingEventId",
        skip_serializing_if = "Option::is_none"
    )]
    pub pending_event_id: Option<String>,

    /// Human-readable hint accompanying an auth-required result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EventOutcome {
    /// Creates a success outcome.
    pub fn created(
        provider: ProviderKind,
        event_id: Option<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            success: true,
            provider: provider.as_str().to_string(),
            event_id,
            link,
            error: None,
            requires_auth: false,
            pending_event_id: None,
            message: None,
        }
    }

    /// Creates a failure outcome carrying an error message.
    pub fn failed(provider: ProviderKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider: provider.as_str().to_string(),
            event_id: None,
            link: None,
            error: Some(error.into()),
            requires_auth: false,
            pending_event_id: None,
            message: None,
        }
    }

    /// Creates an auth-required outcome.
    ///
    /// `pending_event_id` is set when the triggering request was persisted
    /// for replay after authentication completes.
    pub fn auth_required(provider: ProviderKind, pending_event_id: Option<String>) -> Self {
        Self {
            success: false,
            provider: provider.as_str().to_string(),
            event_id: None,
            link: None,
            error: None,
            requires_auth: true,
            pending_event_id,
            message: None,
        }
    }

    /// Builder: attach an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Builder: attach a human-readable hint.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
