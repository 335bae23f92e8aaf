//! Agent configuration.

use std::path::PathBuf;
use std::time::Duration;

use calrelay_protocol::socket_path_from_env;

/// Default maximum number of concurrent client connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 8;

/// Idle timeout for a client connection.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Runtime configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Path of the Unix socket to listen on.
    pub socket_path: PathBuf,
    /// Maximum concurrent client connections.
    pub max_connections: usize,
    /// How long an idle connection is kept open.
    pub idle_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            socket_path: socket_path_from_env(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl AgentConfig {
    /// Creates a configuration from the environment.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Builder: override the socket path.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Builder: override the connection limit.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_connections_floor_is_one() {
        let config = AgentConfig::default().with_max_connections(0);
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn socket_path_override() {
        let config = AgentConfig::default().with_socket_path("/tmp/test.sock");
        assert_eq!(config.socket_path, PathBuf::from("/tmp/test.sock"));
    }
}
