//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Default bind address when neither `PORT` nor `SERVER_ADDR` is set
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8081";

/// Smallest outbound queue that still holds the join snapshot and score
pub const MIN_OUTBOUND_BUFFER: usize = 2;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Directory holding the client bundle served at `/`
    pub static_dir: PathBuf,
    /// Allowed client origins for CORS (empty = any origin)
    pub client_origins: Vec<String>,

    /// Capacity of each session's outbound queue before oldest events drop
    pub outbound_buffer: usize,
    /// Max inbound frames per second per connection
    pub input_rate_limit: u32,
    /// Upgrades beyond this many live sessions are refused
    pub max_connections: usize,
    /// Fixed seed for spawn placement (random when unset)
    pub spawn_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            log_level: "info".to_string(),
            static_dir: PathBuf::from("public"),
            client_origins: Vec::new(),
            outbound_buffer: 256,
            input_rate_limit: 600,
            max_connections: 256,
            spawn_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this so parsing can be exercised
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Hosting platforms hand us PORT; fall back to SERVER_ADDR or default
        let server_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Join queues a snapshot and a score before the writer runs
        let outbound_buffer = parse_or(&lookup, "OUTBOUND_BUFFER", defaults.outbound_buffer)?;
        if outbound_buffer < MIN_OUTBOUND_BUFFER {
            return Err(ConfigError::Invalid(
                "OUTBOUND_BUFFER",
                outbound_buffer.to_string(),
            ));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,

            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),

            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            client_origins,

            outbound_buffer,
            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", defaults.input_rate_limit)?,
            max_connections: parse_or(&lookup, "MAX_CONNECTIONS", defaults.max_connections)?,
            spawn_seed: lookup("SPAWN_SEED")
                .map(|raw| raw.parse::<u64>().map_err(|_| ConfigError::Invalid("SPAWN_SEED", raw)))
                .transpose()?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Invalid server address format: {0:?}")]
    InvalidAddress(String),
}
