// SPDX-License-Identifier: MIT OR Apache-2.0
//! Length-delimited frame codec.
//!
//! Wire format:
//!
//! ```text
//! +------------------+------------------+
//! | Length (4B BE)   | Payload (JSON)   |
//! +------------------+------------------+
//! ```
//!
//! - Length is a 4-byte big-endian u32 counting payload bytes only
//! - Payload is exactly one JSON-serialized [`Envelope`]
//!
//! The explicit prefix replaces the original protocol's
//! "deserialize whatever has accumulated, failure means partial"
//! scheme, which could not tell a truncated frame from a corrupt one
//! (and could in principle accept a truncated prefix that happened to
//! parse). Here a complete payload that fails to parse is a hard
//! protocol error.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::envelope::Envelope;
use crate::error::{WireError, WireResult};

/// Default maximum frame size: 4 MiB.
///
/// Process listings are the largest payload and stay well under this.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Convert a byte length to a 4-byte big-endian length prefix.
fn length_prefix(len: usize, max: usize) -> WireResult<[u8; 4]> {
    let n = u32::try_from(len).map_err(|_| WireError::FrameTooLarge {
        size: len,
        max_size: max,
    })?;
    Ok(n.to_be_bytes())
}

/// Length-delimited codec for [`Envelope`] framing.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl FrameCodec {
    /// Create a codec that rejects payloads larger than `max_frame_size`.
    #[must_use]
    pub const fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// The configured maximum payload size.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Encode one envelope into a complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::FrameTooLarge`] if the serialized payload
    /// exceeds the maximum frame size.
    pub fn encode(&self, envelope: &Envelope) -> WireResult<Vec<u8>> {
        let payload = serde_json::to_vec(envelope)?;

        if payload.len() > self.max_frame_size {
            return Err(WireError::FrameTooLarge {
                size: payload.len(),
                max_size: self.max_frame_size,
            });
        }

        let header = length_prefix(payload.len(), self.max_frame_size)?;
        let mut frame = Vec::with_capacity(LEN_PREFIX + payload.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(&payload);

        Ok(frame)
    }

    /// Try to extract one complete frame from the front of `buf`.
    ///
    /// Consumed bytes are drained from `buf`; leftover bytes stay for
    /// the next call. Returns `Ok(None)` when the buffer holds only a
    /// partial frame, which is the normal state between read chunks.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::FrameTooLarge`] for an oversized declared
    /// length, [`WireError::InvalidFrame`] for a zero-length frame,
    /// or a serialization error when a complete payload fails to
    /// parse. All three poison the connection.
    pub fn decode_buf(&self, buf: &mut Vec<u8>) -> WireResult<Option<Envelope>> {
        if buf.len() < LEN_PREFIX {
            return Ok(None);
        }

        let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

        if length > self.max_frame_size {
            return Err(WireError::FrameTooLarge {
                size: length,
                max_size: self.max_frame_size,
            });
        }

        if length == 0 {
            return Err(WireError::InvalidFrame("zero-length frame".to_string()));
        }

        if buf.len() < LEN_PREFIX + length {
            return Ok(None);
        }

        let envelope: Envelope = serde_json::from_slice(&buf[LEN_PREFIX..LEN_PREFIX + length])?;
        buf.drain(..LEN_PREFIX + length);

        Ok(Some(envelope))
    }

    /// Read one frame. Returns `None` on graceful connection close.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::FrameTooLarge`], [`WireError::InvalidFrame`],
    /// a serialization error, or an I/O error.
    pub async fn read_frame<R>(&self, reader: &mut R) -> WireResult<Option<Envelope>>
    where
        R: AsyncRead + Unpin,
    {
        let mut length_buf = [0u8; LEN_PREFIX];
        match reader.read_exact(&mut length_buf).await {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_be_bytes(length_buf) as usize;

        if length > self.max_frame_size {
            return Err(WireError::FrameTooLarge {
                size: length,
                max_size: self.max_frame_size,
            });
        }

        if length == 0 {
            return Err(WireError::InvalidFrame("zero-length frame".to_string()));
        }

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).await?;

        let envelope = serde_json::from_slice(&payload)?;
        Ok(Some(envelope))
    }

    /// Write one frame in full and flush.
    ///
    /// # Errors
    ///
    /// Returns a serialization or I/O error.
    pub async fn write_frame<W>(&self, writer: &mut W, envelope: &Envelope) -> WireResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.encode(envelope)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::topic::Topic;

    #[test]
    fn test_encode_decode() {
        let codec = FrameCodec::default();
        let envelope = Envelope::request(Topic::Cpu);

        let frame = codec.encode(&envelope).unwrap();
        let length = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(length, frame.len() - 4);

        let mut buf = frame;
        let decoded = codec.decode_buf(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, envelope);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let codec = FrameCodec::default();
        let envelope = Envelope::response(
            crate::CorrelationId::generate(),
            json!({"usage": 42.0}),
        );
        let frame = codec.encode(&envelope).unwrap();

        // Feed the frame one byte at a time; only the last byte yields it.
        let mut buf = Vec::new();
        for (i, byte) in frame.iter().enumerate() {
            buf.push(*byte);
            let result = codec.decode_buf(&mut buf).unwrap();
            if i + 1 < frame.len() {
                assert!(result.is_none(), "yielded early at byte {i}");
            } else {
                assert_eq!(result.unwrap(), envelope);
            }
        }
    }

    #[test]
    fn test_decode_two_frames_in_one_buffer() {
        let codec = FrameCodec::default();
        let a = Envelope::request(Topic::Ram);
        let b = Envelope::request(Topic::Disk);

        let mut buf = codec.encode(&a).unwrap();
        buf.extend_from_slice(&codec.encode(&b).unwrap());

        assert_eq!(codec.decode_buf(&mut buf).unwrap().unwrap(), a);
        assert_eq!(codec.decode_buf(&mut buf).unwrap().unwrap(), b);
        assert!(codec.decode_buf(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_frame_too_large_on_encode() {
        let codec = FrameCodec::new(8);
        let envelope = Envelope::request(Topic::Processes);
        assert!(matches!(
            codec.encode(&envelope),
            Err(WireError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_oversized_declared_length_rejected() {
        let codec = FrameCodec::new(16);
        let mut buf = vec![0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            codec.decode_buf(&mut buf),
            Err(WireError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_zero_length_frame_rejected() {
        let codec = FrameCodec::default();
        let mut buf = vec![0, 0, 0, 0];
        assert!(matches!(
            codec.decode_buf(&mut buf),
            Err(WireError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_corrupt_complete_frame_is_an_error() {
        let codec = FrameCodec::default();
        let mut buf = vec![0, 0, 0, 4];
        buf.extend_from_slice(b"!!!!");
        assert!(matches!(
            codec.decode_buf(&mut buf),
            Err(WireError::Serialization(_))
        ));
    }

    #[test]
    fn test_request_response_id_roundtrip() {
        let codec = FrameCodec::default();

        // Client encodes a request; the peer decodes it and re-encodes
        // a response under the same ID; the client decodes that.
        let request = Envelope::request(Topic::Cpu);
        let mut on_server = codec.encode(&request).unwrap();
        let seen = codec.decode_buf(&mut on_server).unwrap().unwrap();

        let response = Envelope::response(seen.id, json!({"usage": 42}));
        let mut on_client = codec.encode(&response).unwrap();
        let delivered = codec.decode_buf(&mut on_client).unwrap().unwrap();

        assert_eq!(delivered.id, request.id);
        assert_eq!(delivered.data, json!({"usage": 42}));
    }

    #[tokio::test]
    async fn test_read_write_frame() {
        let codec = FrameCodec::default();
        let (mut client, mut server) = tokio::io::duplex(1024);

        let envelope = Envelope::request(Topic::Network);
        codec.write_frame(&mut client, &envelope).await.unwrap();

        let received = codec.read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(received, envelope);
    }

    #[tokio::test]
    async fn test_read_frame_eof_returns_none() {
        let codec = FrameCodec::default();
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        let result = codec.read_frame(&mut server).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_read_frame_truncated_payload_is_io_error() {
        let codec = FrameCodec::default();
        let (mut client, mut server) = tokio::io::duplex(64);

        // Declare 10 payload bytes but send only 3, then close.
        client.write_all(&[0, 0, 0, 10, 1, 2, 3]).await.unwrap();
        drop(client);

        assert!(matches!(
            codec.read_frame(&mut server).await,
            Err(WireError::Io(_))
        ));
    }
}
