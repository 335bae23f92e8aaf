//! Request dispatch.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{info, warn};

use calrelay_core::ProviderKind;
use calrelay_protocol::{ErrorCode, Request, Response, StatusInfo};
use calrelay_providers::outlook::OutlookProvider;
use calrelay_providers::{CalendarProvider, Navigation};

/// Shared agent state.
///
/// Shutdown is a latched flag carried on a watch channel: a request
/// made before anyone is waiting is still observed.
pub struct AgentState {
    started: Instant,
    shutdown: watch::Sender<bool>,
}

impl AgentState {
    /// Creates fresh state with the clock started now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            shutdown: watch::Sender::new(false),
        }
    }

    /// Seconds since the agent started.
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Resolves once shutdown has been requested, including when the
    /// request happened before this call.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives in self, so the channel cannot close early.
        let _ = rx.wait_for(|requested| *requested).await;
    }

    /// Returns true once shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Requests shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches protocol requests to the configured providers.
pub struct RequestHandler {
    state: Arc<AgentState>,
    google: Arc<dyn CalendarProvider>,
    outlook: Arc<OutlookProvider>,
}

impl RequestHandler {
    /// Creates a handler.
    pub fn new(
        state: Arc<AgentState>,
        google: Arc<dyn CalendarProvider>,
        outlook: Arc<OutlookProvider>,
    ) -> Self {
        Self {
            state,
            google,
            outlook,
        }
    }

    /// Handles a single request and produces its response.
    #[tracing::instrument(skip(self, request), fields(request = request_name(&request)))]
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::CreateCalendarEvent { event_data } => {
                let outcome = match event_data.provider {
                    ProviderKind::Google => self.google.create_event(event_data).await,
                    ProviderKind::Outlook => self.outlook.create_event(event_data).await,
                };
                Response::event_result(outcome)
            }

            Request::CompleteAuthorization { redirect_url } => {
                let nav = Navigation::untracked(redirect_url);
                if self.outlook.handle_navigation(&nav).await {
                    Response::Ok
                } else {
                    warn!("submitted URL is not the authorization redirect");
                    Response::error(
                        ErrorCode::InvalidRequest,
                        "URL is not the expected authorization redirect",
                    )
                }
            }

            Request::ReplayPending => {
                let attempted = self.outlook.replay_pending().await;
                Response::replayed(attempted)
            }

            Request::Status => {
                let store = self.outlook.store();
                let info = StatusInfo::new(self.state.uptime_seconds())
                    .with_provider(self.google.name())
                    .with_provider(self.outlook.name())
                    .with_pending_events(store.pending_count())
                    .with_outlook_authenticated(store.has_valid_token());
                Response::status(info)
            }

            Request::Ping => Response::Pong,

            Request::Shutdown => {
                info!("shutdown requested");
                self.state.request_shutdown();
                Response::Ok
            }
        }
    }
}

fn request_name(request: &Request) -> &'static str {
    match request {
        Request::CreateCalendarEvent { .. } => "create_calendar_event",
        Request::CompleteAuthorization { .. } => "complete_authorization",
        Request::ReplayPending => "replay_pending",
        Request::Status => "status",
        Request::Ping => "ping",
        Request::Shutdown => "shutdown",
    }
}
