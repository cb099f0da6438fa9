//! Control channel configuration.

use std::path::PathBuf;

/// Default filesystem path for the control socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/peerwatchd.sock";

/// Control channel configuration.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Filesystem path for the Unix control socket.
    pub socket_path: PathBuf,
    /// Maximum number of simultaneous control clients.
    pub max_clients: usize,
}

impl ControlConfig {
    /// Creates a new configuration for the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            max_clients: 64,
        }
    }

    /// Sets the maximum number of simultaneous control clients.
    pub fn with_max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET_PATH)
    }
}
