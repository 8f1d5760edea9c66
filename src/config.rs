//! Server configuration module
//! Handles runtime configuration parameters for the chat server

use crate::constants::{
    DEFAULT_AVATAR_SIZE, DEFAULT_HOST, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT,
    DEFAULT_SHUFFLE_SECS,
};
use crate::error::{Result, TriadError};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Period between two room shuffles
    pub shuffle_interval: Duration,
    /// Largest inbound text frame accepted, in bytes
    pub max_message_size: usize,
    /// Pixel size requested for avatar images
    pub avatar_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shuffle_interval: Duration::from_secs(DEFAULT_SHUFFLE_SECS),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            avatar_size: DEFAULT_AVATAR_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let host = env::var("TRIAD_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = parse_var("TRIAD_PORT", DEFAULT_PORT)?;
        let shuffle_secs = parse_var("TRIAD_SHUFFLE_SECS", DEFAULT_SHUFFLE_SECS)?;
        let max_message_size = parse_var("TRIAD_MAX_MESSAGE_BYTES", DEFAULT_MAX_MESSAGE_SIZE)?;
        let avatar_size = parse_var("TRIAD_AVATAR_SIZE", DEFAULT_AVATAR_SIZE)?;

        if shuffle_secs == 0 {
            return Err(TriadError::ConfigError(
                "TRIAD_SHUFFLE_SECS must be greater than zero".to_string(),
            ));
        }

        if max_message_size == 0 {
            return Err(TriadError::ConfigError(
                "TRIAD_MAX_MESSAGE_BYTES must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            shuffle_interval: Duration::from_secs(shuffle_secs),
            max_message_size,
            avatar_size,
        })
    }

    /// Configuration with a custom shuffle period, used by tests and demos
    pub fn with_shuffle_interval(shuffle_interval: Duration) -> Self {
        Self {
            shuffle_interval,
            ..Self::default()
        }
    }
}

// Unset variables take the default; set but unparsable ones are an error
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            TriadError::ConfigError(format!("{} has an invalid value: {}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
