//! Line-framing reader.
//!
//! Accumulates bytes from a connection into a [`LineBuffer`] across
//! possibly many partial reads, stopping at a newline, at buffer
//! capacity, or when the peer closes. The trailing newline is never
//! stored. Writes into the buffer are bounds-checked; what happens to a
//! line longer than the buffer is decided by the configured
//! [`OversizePolicy`], not by memory layout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::OversizePolicy;
use crate::error::ServerError;
use crate::line::LineBuffer;

/// Outcome of one `read_line` call.
#[derive(Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// A line is in the buffer. `truncated` is only ever true under
    /// `OversizePolicy::Truncate`; the unread tail of the line stays in
    /// the stream and is read as the next line.
    Line { truncated: bool },
    /// The line exceeded capacity and was discarded through its newline
    /// (`OversizePolicy::Reject`). `len` is the full observed length.
    TooLong { len: usize },
    /// Peer closed the connection with no pending data.
    Closed,
}

/// Read one line from `reader` into `buf`.
///
/// `buf` is cleared first, so no bytes from a previous line survive. On
/// `Ok(LineEvent::Line { .. })` the buffer holds at most `buf.capacity()`
/// bytes with no embedded newline. Transport failures surface as
/// `ServerError::Read`.
pub async fn read_line<R>(
    reader: &mut R,
    buf: &mut LineBuffer,
    policy: OversizePolicy,
) -> Result<LineEvent, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();

    loop {
        let chunk = reader.fill_buf().await.map_err(ServerError::Read)?;
        if chunk.is_empty() {
            // Peer closed; a partial line without its newline still counts.
            return Ok(if buf.is_empty() {
                LineEvent::Closed
            } else {
                LineEvent::Line { truncated: false }
            });
        }

        if let Some(pos) = find_newline(chunk) {
            let accepted = buf.extend_truncated(&chunk[..pos]);
            if accepted == pos {
                reader.consume(pos + 1);
                return Ok(LineEvent::Line { truncated: false });
            }
            // Line is longer than the buffer and the newline is in sight.
            return match policy {
                OversizePolicy::Truncate => {
                    reader.consume(accepted);
                    Ok(LineEvent::Line { truncated: true })
                }
                OversizePolicy::Reject => {
                    let len = buf.len() + (pos - accepted);
                    reader.consume(pos + 1);
                    buf.clear();
                    Ok(LineEvent::TooLong { len })
                }
            };
        }

        let chunk_len = chunk.len();
        let accepted = buf.extend_truncated(chunk);
        if accepted == chunk_len {
            reader.consume(chunk_len);
            continue;
        }

        // Buffer filled mid-chunk with no newline yet.
        match policy {
            OversizePolicy::Truncate => {
                reader.consume(accepted);
                return Ok(LineEvent::Line { truncated: true });
            }
            OversizePolicy::Reject => {
                let mut len = buf.len() + (chunk_len - accepted);
                reader.consume(chunk_len);
                buf.clear();
                return drain_oversize_line(reader, &mut len).await;
            }
        }
    }
}

/// Discard the rest of an oversize line through its newline (or EOF),
/// keeping count of the bytes thrown away.
async fn drain_oversize_line<R>(
    reader: &mut R,
    len: &mut usize,
) -> Result<LineEvent, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await.map_err(ServerError::Read)?;
        if chunk.is_empty() {
            return Ok(LineEvent::TooLong { len: *len });
        }
        if let Some(pos) = find_newline(chunk) {
            *len += pos;
            reader.consume(pos + 1);
            return Ok(LineEvent::TooLong { len: *len });
        }
        *len += chunk.len();
        let chunk_len = chunk.len();
        reader.consume(chunk_len);
    }
}

/// Find `\n` in the chunk, returning its position.
fn find_newline(chunk: &[u8]) -> Option<usize> {
    chunk.iter().position(|&b| b == b'\n')
}
