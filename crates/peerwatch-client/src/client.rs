//! Blocking control-channel client for `peerwatchd`.

use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use peerwatch_wire::{Frame, MessageType, StatusDocument, SubscriptionMask};

use crate::error::{ClientError, ClientResult};

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout.
    pub read_timeout: Option<Duration>,
    /// Write timeout.
    pub write_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Control-channel client for `peerwatchd`.
///
/// This client uses synchronous I/O to talk to the daemon over its Unix
/// socket, sending one request at a time and waiting for the matching
/// response.
///
/// # Example
///
/// ```ignore
/// use peerwatch_client::{Client, ClientConfig, SubscriptionMask};
///
/// let mut client = Client::connect("/var/run/peerwatchd.sock", ClientConfig::default())?;
///
/// // Register a peer to monitor
/// client.request_add(r#"{"peer":"192.0.2.1"}"#)?;
///
/// // Ask for state-change notifications
/// client.subscribe(SubscriptionMask::new(1))?;
/// ```
pub struct Client {
    stream: UnixStream,
    next_id: u16,
}

impl Client {
    /// Connects to a `peerwatchd` control socket.
    pub fn connect(path: impl AsRef<Path>, config: ClientConfig) -> ClientResult<Self> {
        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;

        Ok(Self { stream, next_id: 1 })
    }

    /// Asks the daemon to start monitoring the peers described by `request`.
    ///
    /// `request` is a JSON document naming the peers to add.
    pub fn request_add(&mut self, request: &str) -> ClientResult<()> {
        self.roundtrip(MessageType::RequestAdd, Bytes::copy_from_slice(request.as_bytes()))
    }

    /// Asks the daemon to stop monitoring the peers described by `request`.
    ///
    /// `request` is a JSON document naming the peers to remove.
    pub fn request_del(&mut self, request: &str) -> ClientResult<()> {
        self.roundtrip(MessageType::RequestDel, Bytes::copy_from_slice(request.as_bytes()))
    }

    /// Sets this connection's notification subscription mask.
    ///
    /// A zero mask turns notifications off.
    pub fn subscribe(&mut self, mask: SubscriptionMask) -> ClientResult<()> {
        self.roundtrip(
            MessageType::Notify,
            Bytes::copy_from_slice(&mask.to_payload()),
        )
    }

    /// Reads one notification frame pushed by the daemon.
    ///
    /// Blocks until a frame arrives or the read timeout elapses. Only
    /// meaningful after [`Client::subscribe`] with a non-zero mask.
    pub fn read_notification(&mut self) -> ClientResult<Frame> {
        Ok(Frame::read_from(&mut self.stream)?)
    }

    /// Sends a request frame and waits for the matching status response.
    fn roundtrip(&mut self, msg_type: MessageType, payload: Bytes) -> ClientResult<()> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let frame = Frame::new(msg_type, id, payload);
        frame.write_to(&mut self.stream)?;

        let response = Frame::read_from(&mut self.stream)?;
        if response.message_type() != Some(MessageType::Response) {
            return Err(ClientError::UnexpectedResponse {
                msg_type: response.header.msg_type,
            });
        }
        if response.id() != id {
            return Err(ClientError::ResponseMismatch {
                expected: id,
                received: response.id(),
            });
        }

        let doc = StatusDocument::from_frame(&response)?;
        if doc.is_ok() {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                message: doc.error.unwrap_or_else(|| "unspecified error".to_string()),
            })
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
