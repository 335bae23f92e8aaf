//! IPC message types and framing for calrelay.
//!
//! Communication between the CLI and the agent daemon runs over a Unix
//! socket carrying newline-delimited JSON: one message per line, UTF-8,
//! no interior newlines (serde_json compact output guarantees this).
//!
//! Every message is wrapped in an [`Envelope`] carrying the protocol
//! version and a request id for correlation.
//!
//! # Example
//!
//! ```rust
//! use calrelay_protocol::{Envelope, Request, decode_line, encode_line};
//!
//! let request = Envelope::request("req-1", Request::Ping);
//! let line = encode_line(&request).unwrap();
//! let decoded: Envelope<Request> = decode_line(&line).unwrap();
//! assert_eq!(decoded.request_id, "req-1");
//! ```

mod error;
mod framing;
mod socket;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{LineReader, LineWriter, decode_line, encode_line};
pub use socket::{SOCKET_ENV, default_socket_path, socket_path_from_env};
pub use types::{Envelope, ErrorCode, ErrorResponse, Request, Response, StatusInfo};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum length of a single message line (1 MB).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;
