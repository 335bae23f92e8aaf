//! Unix socket server.
//!
//! Clients connect over a Unix domain socket and exchange
//! newline-delimited JSON envelopes, one request per line. Connections
//! are limited by a semaphore; a connection may send any number of
//! requests before closing.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use calrelay_protocol::{Envelope, ErrorCode, MAX_LINE_BYTES, Request, Response};

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::handler::{AgentState, RequestHandler};

/// Listens on the configured socket and serves client connections.
pub struct SocketServer {
    listener: UnixListener,
    path: PathBuf,
    config: AgentConfig,
    connections: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds the socket, replacing a stale file left by a dead agent.
    ///
    /// If something still accepts connections on the path, another
    /// agent is running and binding fails.
    pub fn bind(config: AgentConfig) -> AgentResult<Self> {
        let path = config.socket_path.clone();

        if path.exists() {
            if std::os::unix::net::UnixStream::connect(&path).is_ok() {
                return Err(AgentError::SocketInUse(path));
            }
            debug!(path = %path.display(), "removing stale socket");
            fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
        }
        info!(path = %path.display(), "listening");

        let connections = Arc::new(Semaphore::new(config.max_connections));
        Ok(Self {
            listener,
            path,
            config,
            connections,
        })
    }

    /// Accepts connections until shutdown is requested.
    pub async fn run(&self, handler: Arc<RequestHandler>, state: Arc<AgentState>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let stream = match accepted {
                        Ok((stream, _)) => stream,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let Ok(permit) = self.connections.clone().acquire_owned().await else {
                        break;
                    };
                    let handler = handler.clone();
                    let idle_timeout = self.config.idle_timeout;
                    tokio::spawn(async move {
                        serve_connection(stream, handler, idle_timeout).await;
                        drop(permit);
                    });
                }
                () = state.wait_for_shutdown() => {
                    info!("stopping accept loop");
                    break;
                }
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Serves one client connection until it closes or goes idle.
async fn serve_connection(
    stream: UnixStream,
    handler: Arc<RequestHandler>,
    idle_timeout: std::time::Duration,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = Vec::with_capacity(1024);

    loop {
        line.clear();
        let read = timeout(
            idle_timeout,
            (&mut reader)
                .take(MAX_LINE_BYTES as u64 + 1)
                .read_until(b'\n', &mut line),
        )
        .await;

        let bytes = match read {
            Ok(Ok(0)) => return,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                debug!(error = %e, "connection read failed");
                return;
            }
            Err(_) => {
                debug!("closing idle connection");
                return;
            }
        };
        if bytes > MAX_LINE_BYTES {
            let reply = Envelope::response(
                "unknown",
                Response::error(ErrorCode::InvalidRequest, "request line too long"),
            );
            let _ = write_reply(&mut write_half, &reply).await;
            return;
        }

        let reply = match calrelay_protocol::decode_line::<Envelope<Request>>(&line) {
            Ok(envelope) if !envelope.is_compatible() => Envelope::response(
                envelope.request_id,
                Response::error(
                    ErrorCode::InvalidRequest,
                    format!("unsupported protocol version {}", envelope.protocol_version),
                ),
            ),
            Ok(envelope) => {
                let response = handler.handle(envelope.payload).await;
                Envelope::response(envelope.request_id, response)
            }
            Err(e) => {
                debug!(error = %e, "malformed request line");
                Envelope::response(
                    "unknown",
                    Response::error(ErrorCode::InvalidRequest, e.to_string()),
                )
            }
        };

        if write_reply(&mut write_half, &reply).await.is_err() {
            return;
        }
    }
}

async fn write_reply(
    write_half: &mut tokio::net::unix::OwnedWriteHalf,
    reply: &Envelope<Response>,
) -> std::io::Result<()> {
    let encoded = calrelay_protocol::encode_line(reply)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    write_half.write_all(&encoded).await?;
    write_half.flush().await
}
