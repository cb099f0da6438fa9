//! Payload types carried inside control frames.
//!
//! Request and response payloads are UTF-8 JSON documents; notify payloads
//! carry a raw 8-byte subscription mask instead.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{WireError, WireResult};
use crate::frame::{Frame, MessageType};

/// Status string reported by successful requests.
pub const STATUS_OK: &str = "ok";

/// Status string reported by failed requests.
pub const STATUS_ERROR: &str = "error";

/// JSON document answering a control request.
///
/// Serializes to `{"status":"ok"}` on success and to
/// `{"status":"error","error":"..."}` on failure; the `error` member is
/// never present on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDocument {
    /// Either [`STATUS_OK`] or [`STATUS_ERROR`].
    pub status: String,
    /// Failure description, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusDocument {
    /// Creates a success document.
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            error: None,
        }
    }

    /// Creates a failure document with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            error: Some(message.into()),
        }
    }

    /// Returns true if this document reports success.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Encodes the document into a response frame echoing `id`.
    pub fn to_frame(&self, id: u16) -> WireResult<Frame> {
        let payload =
            serde_json::to_vec(self).map_err(|e| WireError::Serialization(e.to_string()))?;
        Ok(Frame::new(MessageType::Response, id, Bytes::from(payload)))
    }

    /// Decodes a document from a response frame payload.
    pub fn from_frame(frame: &Frame) -> WireResult<Self> {
        serde_json::from_slice(&frame.payload)
            .map_err(|e| WireError::Deserialization(e.to_string()))
    }
}

/// Per-connection notification subscription mask.
///
/// A zero mask means not subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionMask(u64);

impl SubscriptionMask {
    /// Mask size on the wire in bytes.
    pub const WIRE_SIZE: usize = 8;

    /// The empty mask.
    pub const NONE: Self = Self(0);

    /// Creates a mask from raw bits.
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if any subscription bit is set.
    pub fn is_subscribed(self) -> bool {
        self.0 != 0
    }

    /// Encodes the mask as a big-endian notify payload.
    pub fn to_payload(self) -> [u8; Self::WIRE_SIZE] {
        self.0.to_be_bytes()
    }

    /// Decodes a mask from a notify payload.
    ///
    /// Payloads shorter than [`Self::WIRE_SIZE`] bytes are zero-extended
    /// (missing low bytes read as zero); longer payloads are truncated.
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut raw = [0u8; Self::WIRE_SIZE];
        let n = payload.len().min(Self::WIRE_SIZE);
        raw[..n].copy_from_slice(&payload[..n]);
        Self(u64::from_be_bytes(raw))
    }

    /// Encodes the mask into a notify frame.
    pub fn to_frame(self, id: u16) -> Frame {
        Frame::new(
            MessageType::Notify,
            id,
            Bytes::copy_from_slice(&self.to_payload()),
        )
    }
}

impl From<u64> for SubscriptionMask {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for SubscriptionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
