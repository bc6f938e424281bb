//! Session loop: drives one client connection from greeting to close.

use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ServerError;
use crate::line::{reverse_into, LineBuffer};
use crate::reader::{read_line, LineEvent};
use crate::reply;

/// How a session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client sent a QUIT line and was told goodbye.
    Quit,
    /// Peer closed the connection.
    Disconnected,
}

/// Run one session to completion.
///
/// Greets the client, then repeatedly reads a line, logs it, and either
/// quits or replies with the reversed line. Both line buffers are owned
/// by this call, so nothing carries over between sessions. Read/write
/// errors end the session, not the server.
pub async fn run<S>(stream: S, peer: SocketAddr, config: &Config) -> Result<SessionEnd, ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut line = LineBuffer::new(config.max_line_bytes);
    let mut reversed = LineBuffer::new(config.max_line_bytes);

    reply::send(&mut write_half, reply::GREETING).await?;

    loop {
        match read_line(&mut reader, &mut line, config.oversize_policy).await? {
            LineEvent::Closed => {
                debug!(peer = %peer, "peer disconnected");
                return Ok(SessionEnd::Disconnected);
            }
            LineEvent::TooLong { len } => {
                info!(peer = %peer, len, "discarded oversize line");
                reply::send(&mut write_half, reply::LINE_TOO_LONG).await?;
            }
            LineEvent::Line { truncated } => {
                info!(
                    peer = %peer,
                    line = %String::from_utf8_lossy(line.as_bytes()),
                    "received line"
                );
                if truncated {
                    debug!(peer = %peer, "line truncated to buffer capacity");
                }

                // Prefix match on the first 4 bytes, case-sensitive:
                // "QUITX" and "QUIT anything" also end the session.
                if line.as_bytes().starts_with(b"QUIT") {
                    reply::send(&mut write_half, reply::FAREWELL).await?;
                    return Ok(SessionEnd::Quit);
                }

                reverse_into(line.as_bytes(), &mut reversed)?;
                reply::send_line(&mut write_half, reversed.as_bytes()).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OversizePolicy;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
    use tokio::task::JoinHandle;

    fn peer() -> SocketAddr {
        "127.0.0.1:5700".parse().unwrap()
    }

    fn spawn_session(config: Config) -> (DuplexStream, JoinHandle<Result<SessionEnd, ServerError>>) {
        let (client, server_side) = tokio::io::duplex(1024);
        let handle = tokio::spawn(async move { run(server_side, peer(), &config).await });
        (client, handle)
    }

    async fn read_reply(reader: &mut BufReader<tokio::io::ReadHalf<DuplexStream>>) -> String {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn test_greeting_then_reversed_echo() {
        let (client, _handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);

        assert_eq!(
            read_reply(&mut reader).await,
            "Type QUIT on a line by itself to quit\n"
        );

        write_half.write_all(b"Hello world!\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "!dlrow olleH\n");
    }

    #[tokio::test]
    async fn test_empty_line_reverses_to_empty() {
        let (client, _handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "\n");
    }

    #[tokio::test]
    async fn test_quit_gets_farewell_and_close() {
        let (client, handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"QUIT\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "Goodbye\n");

        // Server side closed; no further bytes.
        let mut rest = String::new();
        assert_eq!(reader.read_line(&mut rest).await.unwrap(), 0);
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::Quit);
    }

    #[tokio::test]
    async fn test_quit_is_a_prefix_match() {
        let (client, handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"QUITnow please\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "Goodbye\n");
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::Quit);
    }

    #[tokio::test]
    async fn test_lowercase_quit_is_just_a_line() {
        let (client, _handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"quit\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "tiuq\n");
    }

    #[tokio::test]
    async fn test_percent_sequences_reverse_literally() {
        let (client, _handle) = spawn_session(Config::default());
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"%s %n %08x\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "x80% n% s%\n");
    }

    #[tokio::test]
    async fn test_oversize_line_rejected_session_continues() {
        let config = Config {
            max_line_bytes: 8,
            oversize_policy: OversizePolicy::Reject,
            ..Config::default()
        };
        let (client, _handle) = spawn_session(config);
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half
            .write_all(b"way more than eight bytes\n")
            .await
            .unwrap();
        assert_eq!(read_reply(&mut reader).await, "ERROR line too long\n");

        write_half.write_all(b"short\n").await.unwrap();
        assert_eq!(read_reply(&mut reader).await, "trohs\n");
    }

    #[tokio::test]
    async fn test_oversize_line_truncated_in_faithful_mode() {
        let config = Config {
            max_line_bytes: 8,
            oversize_policy: OversizePolicy::Truncate,
            ..Config::default()
        };
        let (client, _handle) = spawn_session(config);
        let (read_half, mut write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        write_half.write_all(b"0123456789\n").await.unwrap();
        // First 8 bytes reversed, then the tail as its own line.
        assert_eq!(read_reply(&mut reader).await, "76543210\n");
        assert_eq!(read_reply(&mut reader).await, "98\n");
    }

    #[tokio::test]
    async fn test_disconnect_ends_session_silently() {
        let (client, handle) = spawn_session(Config::default());
        let (read_half, write_half) = tokio::io::split(client);
        let mut reader = BufReader::new(read_half);
        read_reply(&mut reader).await;

        drop(write_half);
        drop(reader);
        assert_eq!(handle.await.unwrap().unwrap(), SessionEnd::Disconnected);
    }
}
