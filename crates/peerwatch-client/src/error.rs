//! Client error types.

use peerwatch_wire::WireError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Wire protocol error.
    #[error("wire protocol error: {0}")]
    Wire(#[from] WireError),

    /// The daemon rejected the request.
    #[error("request rejected by daemon: {message}")]
    Rejected { message: String },

    /// Response id mismatch.
    #[error("response id {received} does not match request id {expected}")]
    ResponseMismatch { expected: u16, received: u16 },

    /// Unexpected frame type where a response was expected.
    #[error("unexpected message type {msg_type} in response")]
    UnexpectedResponse { msg_type: u8 },
}
