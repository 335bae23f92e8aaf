//! Socket rendezvous.
//!
//! Agent and CLI must agree on where the Unix socket lives; the rules
//! live here so both sides resolve the same path.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the socket path.
pub const SOCKET_ENV: &str = "CALRELAY_SOCKET";

/// Default socket location.
///
/// `$XDG_RUNTIME_DIR/calrelay.sock` when available, otherwise a
/// per-user path under /tmp.
pub fn default_socket_path() -> PathBuf {
    if let Ok(dir) = env::var("XDG_RUNTIME_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir).join("calrelay.sock");
    }
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/calrelay-{uid}.sock"))
}

/// Resolves the socket path, honoring the [`SOCKET_ENV`] override.
pub fn socket_path_from_env() -> PathBuf {
    match env::var(SOCKET_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => default_socket_path(),
    }
}
