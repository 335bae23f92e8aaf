//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use calrelay_core::{EventRequest, ProviderKind};

/// Create calendar events through the calrelay agent.
#[derive(Debug, Parser)]
#[command(name = "calrelay", version, about)]
pub struct Cli {
    /// Agent socket path (defaults to the per-user runtime socket).
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// Print raw JSON responses.
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a calendar event.
    CreateEvent(CreateEventArgs),

    /// Finish an Outlook sign-in by pasting the redirect URL from the
    /// browser address bar.
    CompleteAuth {
        /// The full redirect URL, including the `code` parameter.
        url: String,
    },

    /// Replay events queued while unauthenticated.
    Replay,

    /// Show agent status.
    Status,

    /// Check that the agent is running.
    Ping,

    /// Stop the agent.
    Shutdown,
}

/// Arguments for `create-event`.
#[derive(Debug, Args)]
pub struct CreateEventArgs {
    /// Calendar backend (google or outlook).
    #[arg(long, default_value = "outlook")]
    pub provider: ProviderKind,

    /// Event title.
    #[arg(long)]
    pub summary: Option<String>,

    /// Event body text.
    #[arg(long)]
    pub description: Option<String>,

    /// Event start, RFC 3339.
    #[arg(long)]
    pub start: String,

    /// Event end, RFC 3339.
    #[arg(long)]
    pub end: String,

    /// IANA time zone for start and end.
    #[arg(long = "time-zone")]
    pub time_zone: Option<String>,

    /// Attendee email address (repeatable).
    #[arg(long = "attendee")]
    pub attendees: Vec<String>,
}

impl CreateEventArgs {
    /// Builds the event payload.
    pub fn to_event(&self) -> EventRequest {
        let mut event = EventRequest::new(self.provider)
            .with_times(self.start.clone(), self.end.clone());
        if let Some(summary) = &self.summary {
            event = event.with_summary(summary.clone());
        }
        if let Some(description) = &self.description {
            event = event.with_description(description.clone());
        }
        if let Some(time_zone) = &self.time_zone {
            event = event.with_time_zone(time_zone.clone());
        }
        for attendee in &self.attendees {
            event = event.with_attendee(attendee.clone());
        }
        event
    }
}
