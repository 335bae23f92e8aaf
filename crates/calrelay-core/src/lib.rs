//! Core types shared by the calrelay crates: event requests, creation
//! outcomes, and tracing setup.

pub mod event;
pub mod tracing;

pub use event::{
    DEFAULT_TIME_ZONE, EventOutcome, EventRequest, ProviderKind, is_valid_email,
};
pub use tracing::{TracingConfig, TracingError, TracingFormat, init_tracing};
