//! Server error taxonomy.
//!
//! Setup errors (`Bind`, `Listen`) are fatal and abort the process before
//! any client is served. `Accept` is logged and the accept loop continues.
//! `Read`, `Write` and `LineTooLong` are local to a single session.

use std::io;

/// Errors produced by the server, session and line-handling layers.
#[derive(Debug)]
pub enum ServerError {
    /// Could not bind the listening address.
    Bind(io::Error),
    /// Could not start listening on the bound socket.
    Listen(io::Error),
    /// Accepting a connection failed.
    Accept(io::Error),
    /// Reading from a client connection failed.
    Read(io::Error),
    /// Writing to a client connection failed.
    Write(io::Error),
    /// A line exceeded the destination buffer capacity.
    LineTooLong { len: usize, capacity: usize },
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Bind(e) => write!(f, "bind error: {e}"),
            ServerError::Listen(e) => write!(f, "listen error: {e}"),
            ServerError::Accept(e) => write!(f, "error accepting connection: {e}"),
            ServerError::Read(e) => write!(f, "connection read error: {e}"),
            ServerError::Write(e) => write!(f, "connection write error: {e}"),
            ServerError::LineTooLong { len, capacity } => {
                write!(f, "line of {len} bytes exceeds buffer capacity {capacity}")
            }
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(e)
            | ServerError::Listen(e)
            | ServerError::Accept(e)
            | ServerError::Read(e)
            | ServerError::Write(e) => Some(e),
            ServerError::LineTooLong { .. } => None,
        }
    }
}
