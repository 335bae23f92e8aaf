//! The calrelay agent.
//!
//! A long-running process that owns calendar provider state, including
//! the Outlook PKCE authorization lifecycle, and serves requests from
//! the CLI over a Unix socket.

pub mod config;
pub mod error;
pub mod handler;
pub mod notify;
pub mod socket;

use std::sync::Arc;

use tracing::info;

use calrelay_providers::google::{EnvTokenSource, GoogleConfig, GoogleProvider};
use calrelay_providers::outlook::{OutlookConfig, OutlookProvider};
use calrelay_providers::{Notifier, SystemBrowser};

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use handler::{AgentState, RequestHandler};
pub use notify::DesktopNotifier;
pub use socket::SocketServer;

/// Builds the providers and runs the agent until shutdown.
///
/// Shutdown comes from a `Shutdown` request or SIGINT.
pub async fn run(config: AgentConfig) -> AgentResult<()> {
    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier);
    let browser = Arc::new(SystemBrowser);

    let google = Arc::new(GoogleProvider::new(
        GoogleConfig::default(),
        Arc::new(EnvTokenSource),
        notifier.clone(),
    ));
    let outlook = Arc::new(OutlookProvider::new(
        OutlookConfig::default(),
        browser,
        notifier,
    )?);

    let state = Arc::new(AgentState::new());
    let handler = Arc::new(RequestHandler::new(state.clone(), google, outlook));
    let server = SocketServer::bind(config)?;

    tokio::select! {
        () = server.run(handler, state.clone()) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted, shutting down");
            state.request_shutdown();
        }
    }
    Ok(())
}
