//! MLLP over TCP provider
//!
//! Frames each message as `<VT> message <FS><CR>` and waits for the
//! receiver's acknowledgement on the same connection.

use super::traits::{measure, DeliveryFailure, TransmissionProvider};
use crate::domain::{
    TransmissionError, TransmissionProtocol, TransmissionRequest, TransmissionResult,
};
use crate::hl7::Acknowledgment;
use async_trait::async_trait;
use bytes::{Buf, BufMut, BytesMut};
use futures::{SinkExt, StreamExt};
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};

/// Start-of-block byte (vertical tab)
pub const START_BLOCK: u8 = 0x0b;
/// End-of-block byte (file separator)
pub const END_BLOCK: u8 = 0x1c;
/// Trailing carriage return after the end-of-block byte
pub const CARRIAGE_RETURN: u8 = 0x0d;

const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// MLLP framing codec
///
/// Bytes received before a start-of-block are discarded.
#[derive(Debug, Clone)]
pub struct MllpCodec {
    max_frame_bytes: usize,
}

impl MllpCodec {
    pub fn new() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Limits the size of a single incoming frame
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

impl Default for MllpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<String> for MllpCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 3);
        dst.put_u8(START_BLOCK);
        dst.put_slice(item.as_bytes());
        dst.put_u8(END_BLOCK);
        dst.put_u8(CARRIAGE_RETURN);
        Ok(())
    }
}

impl Decoder for MllpCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(start) = src.iter().position(|b| *b == START_BLOCK) else {
            src.clear();
            return Ok(None);
        };
        src.advance(start);

        let end = src
            .windows(2)
            .position(|w| w[0] == END_BLOCK && w[1] == CARRIAGE_RETURN);

        let Some(end) = end else {
            if src.len() > self.max_frame_bytes {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("MLLP frame exceeds {} bytes", self.max_frame_bytes),
                ));
            }
            return Ok(None);
        };

        let frame = src.split_to(end + 2);
        let payload = &frame[1..end];
        String::from_utf8(payload.to_vec())
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Provider for `mllp://host:port`, `tcp://host:port` or bare `host:port`
/// endpoints
#[derive(Debug, Default)]
pub struct MllpProvider;

impl MllpProvider {
    pub fn new() -> Self {
        Self
    }

    /// Extracts `host:port` from an endpoint
    pub fn socket_address(endpoint: &str) -> Option<String> {
        let address = endpoint
            .strip_prefix("mllp://")
            .or_else(|| endpoint.strip_prefix("tcp://"))
            .unwrap_or(endpoint)
            .trim_end_matches('/');

        let (host, port) = address.rsplit_once(':')?;
        if host.is_empty() || host.contains('/') || port.parse::<u16>().ok()? == 0 {
            return None;
        }
        Some(address.to_string())
    }

    async fn deliver(
        &self,
        request: &TransmissionRequest,
    ) -> Result<Option<String>, DeliveryFailure> {
        let address = Self::socket_address(request.endpoint()).ok_or_else(|| {
            TransmissionError::InvalidEndpoint(format!(
                "{}: expected host:port",
                request.endpoint()
            ))
        })?;

        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| TransmissionError::Transport(format!("connect to {address}: {e}")))?;

        let mut transport = Framed::new(stream, MllpCodec::new());
        transport
            .send(request.message().to_string())
            .await
            .map_err(|e| TransmissionError::Transport(format!("write to {address}: {e}")))?;

        let reply = match transport.next().await {
            Some(Ok(reply)) => reply,
            Some(Err(e)) => {
                return Err(
                    TransmissionError::Transport(format!("read from {address}: {e}")).into(),
                )
            }
            None => {
                return Err(TransmissionError::Transport(format!(
                    "{address} closed the connection without an acknowledgment"
                ))
                .into())
            }
        };

        let ack = Acknowledgment::parse(&reply).map_err(|e| {
            TransmissionError::Transport(format!("unreadable acknowledgment: {e}"))
        })?;

        if ack.is_positive() {
            Ok(Some(reply))
        } else {
            Err(DeliveryFailure::rejected(ack.summary(), reply))
        }
    }
}

#[async_trait]
impl TransmissionProvider for MllpProvider {
    fn protocol(&self) -> TransmissionProtocol {
        TransmissionProtocol::Mllp
    }

    fn name(&self) -> &'static str {
        "MLLP Provider"
    }

    async fn send(&self, request: &TransmissionRequest) -> TransmissionResult {
        tracing::debug!(
            request_id = %request.request_id(),
            endpoint = %request.endpoint(),
            "Sending MLLP frame"
        );
        measure(self.deliver(request)).await
    }

    async fn validate_endpoint(&self, endpoint: &str) -> bool {
        Self::socket_address(endpoint).is_some()
    }

    async fn test_connection(&self, endpoint: &str) -> bool {
        let Some(address) = Self::socket_address(endpoint) else {
            return false;
        };
        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(&address)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wraps_frame() {
        let mut codec = MllpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("MSH|^~\\&".to_string(), &mut buf).unwrap();
        assert_eq!(buf[0], START_BLOCK);
        assert_eq!(&buf[buf.len() - 2..], &[END_BLOCK, CARRIAGE_RETURN]);
    }

    #[test]
    fn test_decode_waits_for_complete_frame() {
        let mut codec = MllpCodec::new();
        let mut buf = BytesMut::from(&b"noise\x0bMSH|^~\\&|A"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"\rMSA|AA|1\x1c\r\x0bnext");
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("MSH|^~\\&|A\rMSA|AA|1")
        );
        assert_eq!(&buf[..], b"\x0bnext");
    }

    #[test]
    fn test_decode_rejects_oversized_frame() {
        let mut codec = MllpCodec::with_max_frame_bytes(8);
        let mut buf = BytesMut::from(&b"\x0b0123456789"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_socket_address() {
        assert_eq!(
            MllpProvider::socket_address("mllp://10.0.0.5:2575").as_deref(),
            Some("10.0.0.5:2575")
        );
        assert_eq!(
            MllpProvider::socket_address("tcp://hl7.example.org:6661").as_deref(),
            Some("hl7.example.org:6661")
        );
        assert_eq!(
            MllpProvider::socket_address("localhost:2575").as_deref(),
            Some("localhost:2575")
        );
        assert!(MllpProvider::socket_address("http://host/path").is_none());
        assert!(MllpProvider::socket_address("host").is_none());
        assert!(MllpProvider::socket_address("host:0").is_none());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let provider = MllpProvider::new();
        assert!(!provider.test_connection(&address.to_string()).await);
    }
}
