//! Reading one message at a time off a socket.
//!
//! Mirrors the reference client/server loop: read up to a fixed chunk size
//! with a short timeout so the caller can poll a shutdown flag between
//! reads, decode as UTF-8 JSON, and on anything malformed still try to dig
//! an id out of the bytes so a nack can be addressed back to the sender.

use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;

use bearing_proto::{try_find_id, Envelope};

use crate::error::BusError;

/// Max bytes read per frame. The wire protocol is one JSON object per
/// read, not length-prefixed; 1024 matches what the reference allots.
pub const MAX_FRAME_BYTES: usize = 1024;

const READ_TIMEOUT: Duration = Duration::from_millis(200);

pub enum Frame {
    /// A well-formed envelope.
    Message(Envelope),
    /// Bytes were read but didn't decode; carries the best-effort id to
    /// nack against.
    Malformed { id: i64 },
    /// Nothing arrived within the read timeout; caller should loop and
    /// check its shutdown flag.
    Idle,
}

/// Read and decode a single frame from `reader`.
///
/// Returns `Err(BusError)` only for transport-fatal conditions: the
/// connection reset, aborted, or hit EOF. Decode failures are reported as
/// `Frame::Malformed`, not an error, since the caller should keep the
/// connection open and just nack the bad message.
pub async fn read_frame(reader: &mut OwnedReadHalf) -> Result<Frame, BusError> {
    let mut buf = vec![0u8; MAX_FRAME_BYTES];
    let read = match tokio::time::timeout(READ_TIMEOUT, reader.read(&mut buf)).await {
        Ok(Ok(0)) => return Err(BusError::ConnectionClosed),
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(BusError::Io(e)),
        Err(_) => return Ok(Frame::Idle),
    };
    buf.truncate(read);

    let raw = match std::str::from_utf8(&buf) {
        Ok(s) => s,
        Err(_) => {
            let err = bearing_proto::ProtoError::InvalidUtf8;
            tracing::debug!(error = %err, "received non-utf8 frame");
            return Ok(Frame::Malformed { id: -1 });
        }
    };

    match bearing_proto::decode(raw) {
        Ok(envelope) => Ok(Frame::Message(envelope)),
        Err(_) => Ok(Frame::Malformed {
            id: try_find_id(raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn pipe() -> (OwnedReadHalf, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (read_half, _write_half) = server.into_split();
        (read_half, client)
    }

    #[tokio::test]
    async fn idle_when_nothing_arrives() {
        let (mut reader, _client) = pipe().await;
        match read_frame(&mut reader).await.unwrap() {
            Frame::Idle => {}
            _ => panic!("expected idle"),
        }
    }

    #[tokio::test]
    async fn decodes_a_valid_envelope() {
        let (mut reader, mut client) = pipe().await;
        let body = r#"{"type":"ack","id":7,"time":0.0,"data":{"to":6,"ack":true}}"#;
        client.write_all(body.as_bytes()).await.unwrap();
        match read_frame(&mut reader).await.unwrap() {
            Frame::Message(Envelope::Ack { id, .. }) => assert_eq!(id, 7),
            _ => panic!("expected a decoded ack envelope"),
        }
    }

    #[tokio::test]
    async fn malformed_json_yields_best_effort_id() {
        let (mut reader, mut client) = pipe().await;
        let body = r#"{"type":"ack", "id": 42, garbage"#;
        client.write_all(body.as_bytes()).await.unwrap();
        match read_frame(&mut reader).await.unwrap() {
            Frame::Malformed { id } => assert_eq!(id, 42),
            _ => panic!("expected malformed"),
        }
    }

    #[tokio::test]
    async fn closed_connection_is_fatal() {
        let (mut reader, client) = pipe().await;
        drop(client);
        match read_frame(&mut reader).await {
            Err(BusError::ConnectionClosed) => {}
            _ => panic!("expected connection closed"),
        }
    }
}
