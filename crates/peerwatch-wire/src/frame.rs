//! Frame encoding and decoding for the control protocol.
//!
//! A frame consists of a fixed-size header followed by a variable-size payload.

use std::fmt;
use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{WireError, WireResult};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Frame header size in bytes (length + version + type + id).
pub const FRAME_HEADER_SIZE: usize = 8;

/// Minimum payload size: the shortest legal JSON document.
pub const MIN_PAYLOAD_SIZE: u32 = 2;

/// Maximum payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Control message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Status document answering a request.
    Response = 1,
    /// Add a monitored peer.
    RequestAdd = 2,
    /// Remove a monitored peer.
    RequestDel = 3,
    /// Set the notification subscription mask.
    Notify = 4,
}

impl MessageType {
    /// Returns the wire code for this message type.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a message type by wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Response),
            2 => Some(Self::RequestAdd),
            3 => Some(Self::RequestDel),
            4 => Some(Self::Notify),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Response => "response",
            Self::RequestAdd => "request-add",
            Self::RequestDel => "request-del",
            Self::Notify => "notify",
        };
        f.write_str(name)
    }
}

/// Frame header containing metadata about the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length in bytes, header excluded.
    pub length: u32,
    /// Protocol version.
    pub version: u8,
    /// Message type code.
    pub msg_type: u8,
    /// Correlation id, echoed by responses.
    pub id: u16,
}

impl FrameHeader {
    /// Creates a new frame header for the given payload.
    pub fn new(msg_type: MessageType, id: u16, payload: &[u8]) -> Self {
        Self {
            length: payload.len() as u32,
            version: PROTOCOL_VERSION,
            msg_type: msg_type.code(),
            id,
        }
    }

    /// Encodes the header to bytes.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.length);
        buf.put_u8(self.version);
        buf.put_u8(self.msg_type);
        buf.put_u16(self.id);
    }

    /// Decodes a header from its fixed-size wire form.
    pub fn decode(bytes: &[u8; FRAME_HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            length: buf.get_u32(),
            version: buf.get_u8(),
            msg_type: buf.get_u8(),
            id: buf.get_u16(),
        }
    }

    /// Validates the header.
    pub fn validate(&self) -> WireResult<()> {
        if self.length < MIN_PAYLOAD_SIZE {
            return Err(WireError::PayloadTooShort {
                size: self.length,
                min: MIN_PAYLOAD_SIZE,
            });
        }

        if self.version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }

        if self.length > MAX_PAYLOAD_SIZE {
            return Err(WireError::PayloadTooLarge {
                size: self.length,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(())
    }

    /// Returns the message type, if the code is known.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_code(self.msg_type)
    }
}

/// A complete frame with header and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header.
    pub header: FrameHeader,
    /// Payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame from a payload.
    pub fn new(msg_type: MessageType, id: u16, payload: Bytes) -> Self {
        let header = FrameHeader::new(msg_type, id, &payload);
        Self { header, payload }
    }

    /// Returns the message type, if the header code is known.
    pub fn message_type(&self) -> Option<MessageType> {
        self.header.message_type()
    }

    /// Returns the correlation id.
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Encodes the frame to a byte buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        self.header.encode(buf);
        buf.put_slice(&self.payload);
    }

    /// Encodes the frame to a new byte buffer.
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Returns the total size of the frame in bytes.
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Reads one frame from a blocking stream.
    ///
    /// Intended for blocking clients and tests; the daemon assembles frames
    /// incrementally from readiness events instead.
    pub fn read_from(stream: &mut impl Read) -> WireResult<Self> {
        let mut header_buf = [0u8; FRAME_HEADER_SIZE];
        stream.read_exact(&mut header_buf)?;
        let header = FrameHeader::decode(&header_buf);
        header.validate()?;

        let mut payload = vec![0u8; header.length as usize];
        stream.read_exact(&mut payload)?;

        Ok(Self {
            header,
            payload: Bytes::from(payload),
        })
    }

    /// Writes the frame to a blocking stream.
    pub fn write_to(&self, stream: &mut impl Write) -> WireResult<()> {
        stream.write_all(&self.encode_to_bytes())?;
        Ok(())
    }
}
