//! # peerwatch-wire: Binary control protocol for `peerwatch`
//!
//! This crate defines the binary framing used on the `peerwatch` control
//! socket between the daemon and management clients.
//!
//! ## Frame Format
//!
//! ```text
//! ┌──────────┬─────────┬────────┬──────────┬──────────────────┐
//! │ Length   │ Version │ Type   │ Id       │     Payload      │
//! │ (4 B BE) │ (1 B)   │ (1 B)  │ (2 B BE) │     (var)        │
//! └──────────┴─────────┴────────┴──────────┴──────────────────┘
//! ```
//!
//! - **Length**: Payload length in bytes, header excluded (min 2, max 16 MiB)
//! - **Version**: Protocol version (currently 1)
//! - **Type**: Message type code (response, request-add, request-del, notify)
//! - **Id**: Correlation id, echoed by responses
//! - **Payload**: UTF-8 JSON document, or the raw 8-byte mask for notify
//!
//! ## Message Types
//!
//! Requests flow client → daemon; each is answered with one response frame
//! carrying a [`StatusDocument`]. Frames with unknown type codes are dropped
//! by the daemon without a response.

mod error;
mod frame;
mod message;

pub use error::{WireError, WireResult};
pub use frame::{
    FRAME_HEADER_SIZE, Frame, FrameHeader, MAX_PAYLOAD_SIZE, MIN_PAYLOAD_SIZE, MessageType,
    PROTOCOL_VERSION,
};
pub use message::{STATUS_ERROR, STATUS_OK, StatusDocument, SubscriptionMask};
