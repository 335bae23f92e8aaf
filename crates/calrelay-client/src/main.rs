use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use calrelay_core::{TracingConfig, init_tracing};
use calrelay_protocol::{Request, Response};

mod cli;
mod error;
mod socket;

use cli::{Cli, Command};
use error::ClientResult;
use socket::{SocketClient, resolve_socket_path};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.verbose {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("calrelay: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ClientResult<ExitCode> {
    let socket_path = resolve_socket_path(cli.socket);
    let mut client = SocketClient::connect(&socket_path)?;

    let request = match &cli.command {
        Command::CreateEvent(args) => Request::create_event(args.to_event()),
        Command::CompleteAuth { url } => Request::complete_authorization(url.clone()),
        Command::Replay => Request::ReplayPending,
        Command::Status => Request::Status,
        Command::Ping => Request::Ping,
        Command::Shutdown => Request::Shutdown,
    };

    let response = client.request(request)?;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
        return Ok(exit_code_for(&response));
    }

    print_response(&response);
    Ok(exit_code_for(&response))
}

fn print_response(response: &Response) {
    match response {
        Response::EventResult { outcome } => {
            if outcome.success {
                println!("Event created in {}.", outcome.provider);
                if let Some(link) = &outcome.link {
                    println!("  {link}");
                }
            } else if outcome.requires_auth {
                match &outcome.message {
                    Some(message) => println!("{message}"),
                    None => println!(
                        "Authentication required for {}. Retry after signing in.",
                        outcome.provider
                    ),
                }
                if outcome.pending_event_id.is_some() {
                    println!("The event is queued and will be created automatically.");
                }
            } else {
                println!(
                    "Event creation failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        Response::Replayed { attempted } => match attempted {
            0 => println!("No queued events."),
            1 => println!("Replayed 1 queued event."),
            n => println!("Replayed {n} queued events."),
        },
        Response::Status { info } => {
            println!("uptime: {}s", info.uptime_seconds);
            println!("providers: {}", info.providers.join(", "));
            println!("pending events: {}", info.pending_events);
            println!(
                "outlook: {}",
                if info.outlook_authenticated {
                    "authenticated"
                } else {
                    "not authenticated"
                }
            );
        }
        Response::Ok => println!("ok"),
        Response::Pong => println!("pong"),
        Response::Error { error } => eprintln!("{error}"),
    }
}

fn exit_code_for(response: &Response) -> ExitCode {
    match response {
        Response::EventResult { outcome } if !outcome.success && !outcome.requires_auth => {
            ExitCode::FAILURE
        }
        Response::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
