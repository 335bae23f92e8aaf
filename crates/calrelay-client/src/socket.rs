//! Socket client.

use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use calrelay_protocol::{Envelope, LineReader, LineWriter, Request, Response};

use crate::error::{ClientError, ClientResult};

/// Connects to the agent and exchanges one request per call.
pub struct SocketClient {
    reader: LineReader<BufReader<UnixStream>>,
    writer: LineWriter<UnixStream>,
}

impl SocketClient {
    /// Connects to the agent socket.
    pub fn connect(path: &Path) -> ClientResult<Self> {
        debug!(path = %path.display(), "connecting to agent");
        let stream = UnixStream::connect(path).map_err(|source| ClientError::Connect {
            path: path.display().to_string(),
            source,
        })?;
        let write_stream = stream.try_clone().map_err(|source| ClientError::Connect {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            reader: LineReader::new(BufReader::new(stream)),
            writer: LineWriter::new(write_stream),
        })
    }

    /// Sends a request and waits for the correlated response.
    ///
    /// An error response from the agent is surfaced as [`ClientError::Agent`].
    pub fn request(&mut self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(request_id.clone(), request);

        self.writer.write_message(&envelope)?;
        self.writer.flush()?;

        let reply: Envelope<Response> = self.reader.read_message()?.ok_or(ClientError::NoReply)?;
        if reply.request_id != request_id {
            return Err(ClientError::MismatchedReply {
                expected: request_id,
                actual: reply.request_id,
            });
        }

        match reply.payload {
            Response::Error { error } => Err(ClientError::Agent(error)),
            response => Ok(response),
        }
    }
}

/// Resolves the socket path from the CLI flag or the environment.
pub fn resolve_socket_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(calrelay_protocol::socket_path_from_env)
}
