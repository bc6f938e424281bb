//! TCP server for the reverse-echo protocol.
//!
//! Owns the listening socket. Connections are served strictly
//! sequentially: one session runs to completion before the next accept,
//! so a second client waits in the listen backlog until the current
//! session ends.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::ServerError;
use crate::session::{self, SessionEnd};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Server { config }
    }

    /// Bind the listening socket with the configured backlog depth.
    ///
    /// Uses `socket2` so the backlog (default 5) is explicit rather
    /// than whatever the runtime defaults to.
    pub fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ServerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
            })?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(ServerError::Bind)?;
        socket.set_reuse_address(true).map_err(ServerError::Bind)?;
        socket.bind(&addr.into()).map_err(ServerError::Bind)?;
        socket
            .listen(self.config.backlog)
            .map_err(ServerError::Listen)?;
        socket.set_nonblocking(true).map_err(ServerError::Listen)?;

        TcpListener::from_std(socket.into()).map_err(ServerError::Listen)
    }

    /// Accept loop. Each session is awaited inline; nothing is spawned,
    /// so sessions never overlap and no state is shared between them.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    // A failed accept is not fatal; keep accepting.
                    error!(error = %e, "error accepting connection");
                    continue;
                }
            };

            info!(peer = %peer, "accepted connection");

            match session::run(stream, peer, &self.config).await {
                Ok(SessionEnd::Quit) => debug!(peer = %peer, "session ended by QUIT"),
                Ok(SessionEnd::Disconnected) => debug!(peer = %peer, "session ended by disconnect"),
                Err(e) => debug!(peer = %peer, error = %e, "session ended with error"),
            }
        }
    }

    /// Bind, then serve until the process is interrupted. Ctrl-C stops
    /// the accept loop cleanly instead of killing the process mid-write.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        info!(
            host = %self.config.host,
            port = self.config.port,
            backlog = self.config.backlog,
            "waiting for connections"
        );

        tokio::select! {
            result = self.serve(listener) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                Ok(())
            }
        }
    }
}
