//! Reply writer.
//!
//! Every outbound message is either a `const` byte string or a computed
//! payload written verbatim with `write_all`. Client-supplied bytes are
//! never interpreted as a format or template string, so there is nothing
//! a `%`-laden line can do here except get reversed.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ServerError;

/// Usage hint sent when a session opens.
pub const GREETING: &[u8] = b"Type QUIT on a line by itself to quit\n";

/// Farewell sent before closing a session on QUIT.
pub const FAREWELL: &[u8] = b"Goodbye\n";

/// Reply for a line discarded under `OversizePolicy::Reject`.
pub const LINE_TOO_LONG: &[u8] = b"ERROR line too long\n";

/// Send a complete message, returning the number of bytes written.
pub async fn send<W>(writer: &mut W, message: &[u8]) -> Result<usize, ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message).await.map_err(ServerError::Write)?;
    writer.flush().await.map_err(ServerError::Write)?;
    Ok(message.len())
}

/// Send a payload followed by a newline, returning the bytes written.
pub async fn send_line<W>(writer: &mut W, payload: &[u8]) -> Result<usize, ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await.map_err(ServerError::Write)?;
    writer.write_all(b"\n").await.map_err(ServerError::Write)?;
    writer.flush().await.map_err(ServerError::Write)?;
    Ok(payload.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let mut out = Vec::new();
        let n = send_line(&mut out, b"!dlrow olleH").await.unwrap();
        assert_eq!(out, b"!dlrow olleH\n");
        assert_eq!(n, 13);
    }

    #[tokio::test]
    async fn test_send_constant() {
        let mut out = Vec::new();
        let n = send(&mut out, FAREWELL).await.unwrap();
        assert_eq!(out, b"Goodbye\n");
        assert_eq!(n, FAREWELL.len());
    }

    #[tokio::test]
    async fn test_percent_sequences_are_data() {
        let mut out = Vec::new();
        send_line(&mut out, b"%s %n %08x").await.unwrap();
        assert_eq!(out, b"%s %n %08x\n");
    }
}
