//! Configuration module for the reverse-echo server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// Policy for client lines longer than the line buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Discard the oversize line and reply with an error line.
    Reject,
    /// Keep the first `max_line_bytes` bytes; the remainder of the
    /// stream is read as the next line.
    Truncate,
}

/// Command-line arguments for the reverse-echo server
#[derive(Parser, Debug)]
#[command(name = "reverse-echo")]
#[command(author = "reverse-echo authors")]
#[command(version = "0.1.0")]
#[command(about = "A line-reversing echo server", long_about = None)]
pub struct CliArgs {
    /// TCP port to listen on
    pub port: u16,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Maximum accepted line length in bytes
    #[arg(long)]
    pub max_line_bytes: Option<usize>,

    /// What to do with lines longer than the maximum
    #[arg(long, value_enum)]
    pub oversize_policy: Option<OversizePolicy>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (without port)
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen backlog depth
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            backlog: default_backlog(),
        }
    }
}

/// Protocol-related configuration
#[derive(Debug, Deserialize)]
pub struct ProtocolConfig {
    /// Maximum accepted line length in bytes
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Policy for lines longer than the maximum
    #[serde(default = "default_oversize_policy")]
    pub oversize_policy: OversizePolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
            oversize_policy: default_oversize_policy(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_backlog() -> i32 {
    5
}

fn default_max_line_bytes() -> usize {
    500
}

fn default_oversize_policy() -> OversizePolicy {
    OversizePolicy::Reject
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Value held by [`Config::secret`].
pub const SECRET: u32 = 0xDEAD_C0DE;

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: i32,
    pub max_line_bytes: usize,
    pub oversize_policy: OversizePolicy,
    pub log_level: String,
    /// Fixed in-memory constant kept to demonstrate that nothing on the
    /// output path can disclose process memory. Never written to a reply.
    #[allow(dead_code)]
    pub secret: u32,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(CliArgs::parse())
    }

    /// Merge parsed CLI args with the TOML config they point at.
    pub fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let config = Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port,
            backlog: toml_config.server.backlog,
            max_line_bytes: cli
                .max_line_bytes
                .unwrap_or(toml_config.protocol.max_line_bytes),
            oversize_policy: cli
                .oversize_policy
                .unwrap_or(toml_config.protocol.oversize_policy),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
            secret: SECRET,
        };

        if config.max_line_bytes == 0 {
            return Err(ConfigError::InvalidLineLength);
        }

        Ok(config)
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Config {
            host: default_host(),
            port: 0,
            backlog: default_backlog(),
            max_line_bytes: default_max_line_bytes(),
            oversize_policy: default_oversize_policy(),
            log_level: default_log_level(),
            secret: SECRET,
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidLineLength,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidLineLength => {
                write!(f, "max_line_bytes must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
