//! Calendar provider implementations.
//!
//! This crate defines the [`CalendarProvider`] trait and two backends:
//!
//! - [`google`]: direct Google Calendar API access with a delegated
//!   bearer token.
//! - [`outlook`]: PKCE-authorized access through a local event backend,
//!   with a persistent token store and pending-event replay.

pub mod error;
pub mod google;
pub mod outlook;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use google::GoogleProvider;
pub use outlook::OutlookProvider;
pub use provider::{
    BoxFuture, Browser, CalendarProvider, LogNotifier, Navigation, Notifier, SystemBrowser,
    TabHandle,
};
