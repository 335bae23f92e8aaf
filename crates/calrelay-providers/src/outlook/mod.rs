//! Outlook calendar provider.
//!
//! Events are created through a local backend service that talks to the
//! Microsoft Graph API. Authorization uses the OAuth 2.0 authorization
//! code flow with PKCE against the Microsoft identity platform; the
//! resulting bearer token, the in-flight PKCE verifier, and any events
//! queued while unauthenticated all live in a persistent store.

pub mod auth;
pub mod backend;
pub mod config;
pub mod pkce;
pub mod provider;
pub mod store;

pub use auth::Authorizer;
pub use backend::BackendClient;
pub use config::OutlookConfig;
pub use pkce::PkcePair;
pub use provider::OutlookProvider;
pub use store::{OutlookStore, PendingEvent, StoredToken};
