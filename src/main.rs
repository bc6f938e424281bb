//! reverse-echo: a line-reversing echo server
//!
//! Accepts one TCP client at a time, greets it, and echoes every
//! newline-terminated line back reversed until the client sends QUIT
//! or disconnects.
//!
//! Features:
//! - Newline-delimited text protocol with a bounded line length
//! - Configurable oversize-line policy (reject or truncate)
//! - Configuration via CLI arguments or TOML file

mod config;
mod error;
mod line;
mod reader;
mod reply;
mod server;
mod session;

use config::Config;
use server::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        max_line_bytes = config.max_line_bytes,
        oversize_policy = ?config.oversize_policy,
        "Starting reverse-echo server"
    );

    // One client at a time: a single-threaded runtime is all this needs.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(Server::new(config).run())?;

    Ok(())
}
