use std::process::ExitCode;

use calrelay_agent::{AgentConfig, run};
use calrelay_core::{TracingConfig, init_tracing};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing(TracingConfig::agent()) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = AgentConfig::from_env();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "agent failed");
            eprintln!("calrelay-agent: {e}");
            ExitCode::FAILURE
        }
    }
}
