//! Connection state management.

use mio::net::UnixStream;
use mio::{Interest, Token};
use peerwatch_wire::{Frame, SubscriptionMask};

use crate::error::ControlResult;
use crate::framer::{FrameReader, FrameWriter, ReadProgress, WriteProgress};

/// State of a control client connection.
pub struct Connection {
    /// Unique token for this connection.
    pub token: Token,
    /// Unix stream.
    pub stream: UnixStream,
    /// Incremental frame assembly state.
    pub reader: FrameReader,
    /// Outbound frame slot.
    pub writer: FrameWriter,
    /// Notification subscription mask.
    pub subscription: SubscriptionMask,
    /// Whether the connection is closing.
    pub closing: bool,
}

impl Connection {
    /// Creates a new connection.
    pub fn new(token: Token, stream: UnixStream) -> Self {
        Self {
            token,
            stream,
            reader: FrameReader::new(),
            writer: FrameWriter::new(),
            subscription: SubscriptionMask::NONE,
            closing: false,
        }
    }

    /// Drives the read machine with whatever the socket has buffered.
    pub fn read_frame(&mut self) -> ControlResult<ReadProgress> {
        self.reader.advance(&mut self.stream)
    }

    /// Queues a response or notification frame for flushing.
    pub fn enqueue(&mut self, frame: &Frame) -> ControlResult<()> {
        self.writer.enqueue(frame)
    }

    /// Flushes queued bytes to the socket.
    pub fn flush(&mut self) -> ControlResult<WriteProgress> {
        self.writer.flush(&mut self.stream)
    }

    /// Returns true if an outbound frame is queued or draining.
    pub fn has_pending_write(&self) -> bool {
        self.writer.has_pending()
    }

    /// Returns the interest flags for this connection.
    ///
    /// Reads pause while a message drains: write interest only during a
    /// flush, read interest only otherwise.
    pub fn interest(&self) -> Interest {
        if self.writer.has_pending() {
            Interest::WRITABLE
        } else {
            Interest::READABLE
        }
    }
}
