//! Control channel error types.

use std::path::PathBuf;

use mio::Token;
use peerwatch_wire::WireError;
use thiserror::Error;

/// Result type for control channel operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while running the control channel.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Wire protocol error.
    #[error("wire protocol error: {0}")]
    Wire(#[from] WireError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Bind failed.
    #[error("failed to bind control socket {}: {source}", path.display())]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A frame is already queued on this connection.
    #[error("a message is already queued for this connection")]
    WriteBusy,

    /// No live connection under the given token.
    #[error("unknown connection token {0:?}")]
    UnknownConnection(Token),
}
