//! Length-prefixed framing used by the terminal API.
//!
//! After the initial `API\0` prefix every message is a 4-byte big-endian
//! length followed by NUL-terminated text fields.

use quotes_core::error::SessionError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const API_PREFIX: &[u8] = b"API\0";
pub const MIN_CLIENT_VERSION: i32 = 100;
pub const MAX_CLIENT_VERSION: i32 = 176;

const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Prefix a payload with its big-endian length.
pub fn encode_raw(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Encode a message from its fields.
pub fn encode_frame<S: AsRef<str>>(fields: &[S]) -> Vec<u8> {
    let mut payload = Vec::new();
    for field in fields {
        payload.extend_from_slice(field.as_ref().as_bytes());
        payload.push(0);
    }
    encode_raw(&payload)
}

/// Bytes the client sends right after the TCP connect.
pub fn handshake() -> Vec<u8> {
    let versions = format!("v{}..{}", MIN_CLIENT_VERSION, MAX_CLIENT_VERSION);
    let mut buf = API_PREFIX.to_vec();
    buf.extend_from_slice(&encode_raw(versions.as_bytes()));
    buf
}

/// Split a frame payload into its fields.
pub fn decode_fields(payload: &[u8]) -> Vec<String> {
    let mut fields: Vec<String> = payload
        .split(|b| *b == 0)
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect();
    // Every field is NUL-terminated, so the split leaves one empty tail.
    if payload.last() == Some(&0) {
        fields.pop();
    }
    fields
}

/// Read one frame. Returns `None` when the peer closed between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<String>>, SessionError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(SessionError::Protocol(format!("Frame of {} bytes exceeds limit", len)));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(decode_fields(&payload)))
}

/// Write one frame and flush it.
pub async fn write_frame<W, S>(writer: &mut W, fields: &[S]) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    writer.write_all(&encode_frame(fields)).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(&["59", "1", "3"]);
        assert_eq!(&frame[..4], &[0, 0, 0, 7]);
        assert_eq!(&frame[4..], b"59\x001\x003\x00");
    }

    #[test]
    fn test_handshake_prefix() {
        let bytes = handshake();
        assert!(bytes.starts_with(API_PREFIX));
        assert_eq!(&bytes[8..], b"v100..176");
    }

    #[test]
    fn test_decode_keeps_empty_fields() {
        let fields = decode_fields(b"71\x002\x0010\x00\x00");
        assert_eq!(fields, vec!["71", "2", "10", ""]);
    }

    #[tokio::test]
    async fn test_read_frame_from_stream() {
        let mut bytes = encode_frame(&["9", "1", "1"]);
        bytes.extend(encode_frame(&["46", "6", "2", "47", "0.45"]));
        let mut reader = &bytes[..];

        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first, vec!["9", "1", "1"]);
        let second = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(second[4], "0.45");
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let bytes = (u32::MAX).to_be_bytes();
        let mut reader = &bytes[..];
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(SessionError::Protocol(_))
        ));
    }
}
