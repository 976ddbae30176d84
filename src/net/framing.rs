//! Length-prefixed message framing for the Master connection.
//!
//! Frames use an HTTP-style `Content-Length` header so that message
//! boundaries survive TCP's stream semantics:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <envelope-body>
//! ```
//!
//! One frame carries exactly one protocol envelope. Header parsing is
//! case-insensitive and accepts both CRLF and LF line endings.

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame size (16MB). A store listing is at most a few hundred KB;
/// anything larger indicates a broken or hostile peer.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Read one framed message from the stream.
///
/// # Errors
///
/// Returns an error if the stream ends before a frame completes, the
/// `Content-Length` header is missing or invalid, the declared length exceeds
/// [`MAX_FRAME_SIZE`], or the body is not valid UTF-8.
pub async fn read_frame<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("Failed to read frame header")?;

        // EOF before the frame completed
        if bytes_read == 0 {
            return Err(anyhow!("Connection closed before a reply was received"));
        }

        let trimmed = line.trim();

        // Blank line ends the header section
        if trimmed.is_empty() {
            break;
        }

        if let Some(colon) = trimmed.find(':') {
            let key = trimmed[..colon].trim();
            let value = trimmed[colon + 1..].trim();
            if key.eq_ignore_ascii_case("Content-Length") {
                content_length = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid Content-Length value: {}", value))?,
                );
            }
            // Unknown headers are ignored for forward compatibility
        }
    }

    let size = content_length.ok_or_else(|| anyhow!("Missing Content-Length header"))?;

    if size > MAX_FRAME_SIZE {
        return Err(anyhow!(
            "Frame size {} exceeds maximum {} bytes",
            size,
            MAX_FRAME_SIZE
        ));
    }

    let mut body = vec![0u8; size];
    reader
        .read_exact(&mut body)
        .await
        .context("Failed to read frame body")?;

    String::from_utf8(body).context("Frame body is not valid UTF-8")
}

/// Write one framed message and flush it.
///
/// The flush guarantees the frame is on the wire before the caller proceeds
/// to read the reply.
pub async fn write_frame<W>(writer: &mut W, body: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let body_bytes = body.as_bytes();
    let header = format!("Content-Length: {}\r\n\r\n", body_bytes.len());

    writer
        .write_all(header.as_bytes())
        .await
        .context("Failed to write frame header")?;

    writer
        .write_all(body_bytes)
        .await
        .context("Failed to write frame body")?;

    writer.flush().await.context("Failed to flush frame")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncWriteExt, BufReader};
    use tokio::time::timeout;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (mut a, b) = duplex(4096);
        let body = r#"{"v":1,"op":"client","payload":{}}"#;

        write_frame(&mut a, body).await.expect("Write failed");

        let mut reader = BufReader::new(b);
        let received = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(received, body);
    }

    #[tokio::test]
    async fn test_two_frames_keep_boundaries() {
        let (mut a, b) = duplex(4096);

        write_frame(&mut a, "first").await.unwrap();
        write_frame(&mut a, "second body").await.unwrap();

        let mut reader = BufReader::new(b);
        assert_eq!(read_frame(&mut reader).await.unwrap(), "first");
        assert_eq!(read_frame(&mut reader).await.unwrap(), "second body");
    }

    #[tokio::test]
    async fn test_missing_content_length() {
        let (mut a, b) = duplex(4096);

        a.write_all(b"\r\n").await.unwrap();
        drop(a);

        let mut reader = BufReader::new(b);
        let err = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out")
            .unwrap_err();
        assert!(
            err.to_string().contains("Missing Content-Length"),
            "Unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_lowercase_header_accepted() {
        let (mut a, b) = duplex(4096);

        let body = r#"{"ok":true}"#;
        let raw = format!("content-length: {}\r\n\r\n{}", body.len(), body);
        a.write_all(raw.as_bytes()).await.unwrap();

        let mut reader = BufReader::new(b);
        assert_eq!(read_frame(&mut reader).await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_lf_only_headers_accepted() {
        let (mut a, b) = duplex(4096);

        let body = "payload";
        let raw = format!("Content-Length: {}\n\n{}", body.len(), body);
        a.write_all(raw.as_bytes()).await.unwrap();

        let mut reader = BufReader::new(b);
        assert_eq!(read_frame(&mut reader).await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, b) = duplex(4096);

        let raw = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_SIZE + 1);
        a.write_all(raw.as_bytes()).await.unwrap();

        let mut reader = BufReader::new(b);
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(
            err.to_string().contains("exceeds maximum"),
            "Unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_eof_before_frame() {
        let (a, b) = duplex(4096);
        drop(a);

        let mut reader = BufReader::new(b);
        let err = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out")
            .unwrap_err();
        assert!(
            err.to_string().contains("closed"),
            "Unexpected error: {}",
            err
        );
    }

    #[tokio::test]
    async fn test_eof_mid_body() {
        let (mut a, b) = duplex(4096);

        // Declare 100 bytes but send only 5
        a.write_all(b"Content-Length: 100\r\n\r\nhello")
            .await
            .unwrap();
        drop(a);

        let mut reader = BufReader::new(b);
        let err = timeout(TEST_TIMEOUT, read_frame(&mut reader))
            .await
            .expect("Test timed out")
            .unwrap_err();
        assert!(
            err.to_string().contains("body"),
            "Unexpected error: {}",
            err
        );
    }
}
