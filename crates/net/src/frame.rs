//! Length-prefixed JSON framing
//!
//! Wire format: [4-byte big-endian length][JSON payload]

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Largest accepted payload. A full page of long messages fits comfortably.
pub const MAX_FRAME_SIZE: u32 = 4 * 1024 * 1024;

async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::ConnectionClosed),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Read one frame and decode its payload
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut header = [0u8; 4];
    fill(reader, &mut header).await?;

    let len = u32::from_be_bytes(header);
    if len == 0 || len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!("Bad frame length {}", len)));
    }

    let mut payload = vec![0u8; len as usize];
    fill(reader, &mut payload).await?;

    serde_json::from_slice(&payload).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
}

/// Encode a value and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload =
        serde_json::to_vec(value).map_err(|e| Error::Protocol(format!("Encode failed: {}", e)))?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or_else(|| Error::Protocol(format!("Frame too large: {} bytes", payload.len())))?;

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&payload);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireMessage;
    use std::io::Cursor;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_two_frames_back_to_back() {
        let first = WireMessage::Ping {
            request_id: Uuid::new_v4(),
        };
        let second = WireMessage::Pong {
            request_id: Uuid::new_v4(),
        };

        let mut buf = Vec::new();
        write_frame(&mut buf, &first).await.unwrap();
        write_frame(&mut buf, &second).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let a: WireMessage = read_frame(&mut cursor).await.unwrap();
        let b: WireMessage = read_frame(&mut cursor).await.unwrap();
        assert_eq!(a.request_id(), first.request_id());
        assert!(matches!(b, WireMessage::Pong { .. }));

        let end: Result<WireMessage> = read_frame(&mut cursor).await;
        assert!(matches!(end, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_bad_lengths_rejected() {
        for len in [0u32, MAX_FRAME_SIZE + 1] {
            let mut cursor = Cursor::new(len.to_be_bytes().to_vec());
            let result: Result<WireMessage> = read_frame(&mut cursor).await;
            assert!(matches!(result, Err(Error::Protocol(_))));
        }
    }

    #[tokio::test]
    async fn test_truncated_payload_is_connection_closed() {
        let mut bytes = 10u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"{\"t");
        let mut cursor = Cursor::new(bytes);
        let result: Result<WireMessage> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_protocol_error() {
        let mut bytes = 3u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"nop");
        let mut cursor = Cursor::new(bytes);
        let result: Result<WireMessage> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
