//! Google Calendar provider.
//!
//! Talks to the Google Calendar v3 API directly. Authentication is
//! delegated to a [`TokenSource`]; this provider never runs an OAuth
//! flow of its own.

pub mod client;
pub mod config;
pub mod provider;
pub mod token;

pub use client::GoogleCalendarClient;
pub use config::GoogleConfig;
pub use provider::GoogleProvider;
pub use token::{EnvTokenSource, StaticTokenSource, TokenSource};
