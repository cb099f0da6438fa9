//! Request routing for completed frames.

use peerwatch_wire::{Frame, MessageType, StatusDocument, SubscriptionMask};
use thiserror::Error;
use tracing::debug;

use crate::connection::Connection;
use crate::error::ControlResult;

/// Fixed failure message reported for rejected add requests.
pub const REQUEST_ADD_FAILED: &str = "request add failed";

/// Fixed failure message reported for rejected del requests.
pub const REQUEST_DEL_FAILED: &str = "request del failed";

/// Monitored-item configuration store fed by the control channel.
///
/// Implementations own request semantics. The engine only routes payloads
/// here and reports success or failure back to the client; rejection
/// details stay in the daemon log.
pub trait ConfigBackend {
    /// Adds a monitored peer described by a JSON document.
    fn request_add(&mut self, request: &str) -> Result<(), BackendError>;

    /// Removes a monitored peer described by a JSON document.
    fn request_del(&mut self, request: &str) -> Result<(), BackendError>;
}

/// Rejection reported by a [`ConfigBackend`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(String);

impl BackendError {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Routes one completed frame.
///
/// Requests are answered with a status document echoing the request id.
/// Frames the daemon does not handle (inbound responses, unknown codes) are
/// logged and dropped without a response; the connection stays open either
/// way. Only transport-level failures bubble up.
pub(crate) fn dispatch<B>(
    conn: &mut Connection,
    frame: &Frame,
    backend: &mut B,
) -> ControlResult<()>
where
    B: ConfigBackend + ?Sized,
{
    match frame.message_type() {
        Some(MessageType::RequestAdd) => {
            let doc = match parse_payload(frame).and_then(|req| backend.request_add(req)) {
                Ok(()) => StatusDocument::ok(),
                Err(e) => {
                    debug!("Add request rejected: {}", e);
                    StatusDocument::error(REQUEST_ADD_FAILED)
                }
            };
            respond(conn, frame.id(), &doc)
        }
        Some(MessageType::RequestDel) => {
            let doc = match parse_payload(frame).and_then(|req| backend.request_del(req)) {
                Ok(()) => StatusDocument::ok(),
                Err(e) => {
                    debug!("Del request rejected: {}", e);
                    StatusDocument::error(REQUEST_DEL_FAILED)
                }
            };
            respond(conn, frame.id(), &doc)
        }
        Some(MessageType::Notify) => {
            let mask = SubscriptionMask::from_payload(&frame.payload);
            conn.subscription = mask;
            debug!("Subscription mask set to {}", mask);
            respond(conn, frame.id(), &StatusDocument::ok())
        }
        Some(MessageType::Response) | None => {
            debug!(
                "Unhandled message type {}, dropping frame",
                frame.header.msg_type
            );
            Ok(())
        }
    }
}

/// Borrows the request payload as JSON text.
fn parse_payload(frame: &Frame) -> Result<&str, BackendError> {
    std::str::from_utf8(&frame.payload)
        .map_err(|_| BackendError::new("request payload is not valid UTF-8"))
}

/// Queues the response frame for the request id.
fn respond(conn: &mut Connection, id: u16, doc: &StatusDocument) -> ControlResult<()> {
    let frame = doc.to_frame(id)?;
    conn.enqueue(&frame)
}

#[cfg(test)]
mod dispatch_tests {
    use bytes::Bytes;
    use mio::net::UnixStream;
    use mio::Token;
    use peerwatch_wire::FrameHeader;

    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        adds: Vec<String>,
        dels: Vec<String>,
        reject: bool,
    }

    impl ConfigBackend for RecordingBackend {
        fn request_add(&mut self, request: &str) -> Result<(), BackendError> {
            if self.reject {
                return Err(BackendError::new("rejected by test"));
            }
            self.adds.push(request.to_string());
            Ok(())
        }

        fn request_del(&mut self, request: &str) -> Result<(), BackendError> {
            if self.reject {
                return Err(BackendError::new("rejected by test"));
            }
            self.dels.push(request.to_string());
            Ok(())
        }
    }

    fn test_connection() -> Connection {
        let (stream, _peer) = UnixStream::pair().expect("Failed to create socket pair");
        Connection::new(Token(1), stream)
    }

    /// Flushes the queued response into a buffer and decodes it.
    fn take_response(conn: &mut Connection) -> Frame {
        let mut sink = Vec::new();
        conn.writer.flush(&mut sink).expect("flush failed");
        Frame::read_from(&mut std::io::Cursor::new(sink)).expect("decode failed")
    }

    #[test]
    fn test_add_request_records_and_responds_ok() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend::default();
        let frame = Frame::new(
            MessageType::RequestAdd,
            21,
            Bytes::from(r#"{"peer":"192.0.2.1"}"#),
        );

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        assert_eq!(backend.adds, vec![r#"{"peer":"192.0.2.1"}"#.to_string()]);
        let response = take_response(&mut conn);
        assert_eq!(response.id(), 21);
        assert_eq!(&response.payload[..], br#"{"status":"ok"}"#);
    }

    #[test]
    fn test_rejected_del_reports_fixed_message() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend {
            reject: true,
            ..Default::default()
        };
        let frame = Frame::new(MessageType::RequestDel, 7, Bytes::from("{}"));

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        let response = take_response(&mut conn);
        assert_eq!(response.id(), 7);
        assert_eq!(
            &response.payload[..],
            br#"{"status":"error","error":"request del failed"}"#
        );
    }

    #[test]
    fn test_notify_stores_mask_and_responds_ok() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend::default();
        let frame = Frame::new(
            MessageType::Notify,
            3,
            Bytes::copy_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0xFF]),
        );

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        assert_eq!(conn.subscription.bits(), 255);
        let response = take_response(&mut conn);
        assert_eq!(response.id(), 3);
        assert!(StatusDocument::from_frame(&response).unwrap().is_ok());
    }

    #[test]
    fn test_unknown_type_is_dropped_without_response() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend::default();
        let frame = Frame {
            header: FrameHeader {
                length: 2,
                version: 1,
                msg_type: 9,
                id: 4,
            },
            payload: Bytes::from("{}"),
        };

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        assert!(!conn.has_pending_write());
        assert!(!conn.closing);
        assert!(backend.adds.is_empty());
        assert!(backend.dels.is_empty());
    }

    #[test]
    fn test_inbound_response_is_dropped() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend::default();
        let frame = Frame::new(MessageType::Response, 8, Bytes::from(r#"{"status":"ok"}"#));

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        assert!(!conn.has_pending_write());
        assert!(!conn.closing);
    }

    #[test]
    fn test_non_utf8_payload_is_request_failure() {
        let mut conn = test_connection();
        let mut backend = RecordingBackend::default();
        let frame = Frame::new(
            MessageType::RequestAdd,
            12,
            Bytes::copy_from_slice(&[0xFF, 0xFE, 0x80]),
        );

        dispatch(&mut conn, &frame, &mut backend).unwrap();

        assert!(backend.adds.is_empty());
        let response = take_response(&mut conn);
        assert_eq!(response.id(), 12);
        assert_eq!(
            &response.payload[..],
            br#"{"status":"error","error":"request add failed"}"#
        );
    }
}
