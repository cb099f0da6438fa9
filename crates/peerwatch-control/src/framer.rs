//! Incremental frame assembly and flushing over non-blocking streams.
//!
//! The control socket delivers bytes in arbitrary chunks. Both machines here
//! park on `WouldBlock` and resume exactly where they stopped, so a frame
//! split at any offset (including inside the header) assembles correctly.

use std::io::{self, Read, Write};

use bytes::Bytes;
use peerwatch_wire::{FRAME_HEADER_SIZE, Frame, FrameHeader};

use crate::error::{ControlError, ControlResult};

/// Progress of an incremental read.
#[derive(Debug)]
pub enum ReadProgress {
    /// A complete frame was assembled.
    Frame(Frame),
    /// The stream has no more bytes for now.
    Pending,
    /// The peer closed the stream.
    Closed,
}

/// Progress of an incremental flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteProgress {
    /// The queued frame was written out completely.
    Flushed,
    /// The stream cannot take more bytes for now.
    Pending,
    /// The peer closed the stream (zero-byte write).
    Closed,
}

/// Read phase of the assembly machine.
enum ReadState {
    /// Accumulating the fixed-size header.
    Header {
        buf: [u8; FRAME_HEADER_SIZE],
        filled: usize,
    },
    /// Accumulating the payload announced by a validated header.
    Body {
        header: FrameHeader,
        payload: Vec<u8>,
        filled: usize,
    },
}

impl ReadState {
    fn header() -> Self {
        Self::Header {
            buf: [0u8; FRAME_HEADER_SIZE],
            filled: 0,
        }
    }
}

/// Two-phase incremental frame reader.
///
/// Header bytes collect into a fixed array; once the header validates, a
/// payload buffer of exactly the announced length is allocated and filled.
/// Completing a body yields the frame and resets the machine for the next
/// header. A persisted `Body` state always has room left, so reads never
/// see an empty destination slice.
pub struct FrameReader {
    state: ReadState,
}

impl FrameReader {
    /// Creates a reader waiting for a header.
    pub fn new() -> Self {
        Self {
            state: ReadState::header(),
        }
    }

    /// Drives the machine with bytes from `stream` until a frame completes,
    /// the stream runs dry, or the peer closes.
    ///
    /// Header validation failures surface as wire errors before any payload
    /// is allocated; the caller tears the connection down without writing a
    /// response. `Interrupted` reads retry immediately.
    pub fn advance(&mut self, stream: &mut impl Read) -> ControlResult<ReadProgress> {
        loop {
            match &mut self.state {
                ReadState::Header { buf, filled } => match stream.read(&mut buf[*filled..]) {
                    Ok(0) => return Ok(ReadProgress::Closed),
                    Ok(n) => {
                        *filled += n;
                        if *filled == FRAME_HEADER_SIZE {
                            let header = FrameHeader::decode(buf);
                            header.validate()?;
                            self.state = ReadState::Body {
                                header,
                                payload: vec![0u8; header.length as usize],
                                filled: 0,
                            };
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                        return Ok(ReadProgress::Pending);
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e.into()),
                },
                ReadState::Body {
                    header,
                    payload,
                    filled,
                } => match stream.read(&mut payload[*filled..]) {
                    Ok(0) => return Ok(ReadProgress::Closed),
                    Ok(n) => {
                        *filled += n;
                        if *filled == payload.len() {
                            let frame = Frame {
                                header: *header,
                                payload: Bytes::from(std::mem::take(payload)),
                            };
                            self.state = ReadState::header();
                            return Ok(ReadProgress::Frame(frame));
                        }
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                        return Ok(ReadProgress::Pending);
                    }
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e.into()),
                },
            }
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-slot outbound frame writer.
///
/// Holds at most one encoded frame and flushes it incrementally. Enqueueing
/// while a frame is still pending is refused with
/// [`ControlError::WriteBusy`]: the protocol allows one in-flight message
/// per direction.
pub struct FrameWriter {
    pending: Option<PendingFrame>,
}

struct PendingFrame {
    bytes: Bytes,
    written: usize,
}

impl FrameWriter {
    /// Creates an idle writer.
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Queues a frame for flushing.
    pub fn enqueue(&mut self, frame: &Frame) -> ControlResult<()> {
        if self.pending.is_some() {
            return Err(ControlError::WriteBusy);
        }

        self.pending = Some(PendingFrame {
            bytes: frame.encode_to_bytes(),
            written: 0,
        });
        Ok(())
    }

    /// Returns true if a frame is queued or partially flushed.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Writes queued bytes to `stream` until done or the stream fills up.
    ///
    /// A zero-byte write means the peer is gone and mirrors the reader's
    /// close handling. `Interrupted` writes retry immediately.
    pub fn flush(&mut self, stream: &mut impl Write) -> ControlResult<WriteProgress> {
        let Some(pending) = &mut self.pending else {
            return Ok(WriteProgress::Flushed);
        };

        while pending.written < pending.bytes.len() {
            match stream.write(&pending.bytes[pending.written..]) {
                Ok(0) => return Ok(WriteProgress::Closed),
                Ok(n) => pending.written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(WriteProgress::Pending);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.pending = None;
        Ok(WriteProgress::Flushed)
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
