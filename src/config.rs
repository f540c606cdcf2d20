//! Configuration for redwire
//!
//! Centralized connection settings with sensible defaults.

use std::time::Duration;

use crate::error::{RedwireError, Result};

/// Default server port
pub const DEFAULT_PORT: u16 = 6379;

/// Default database index selected on every (re)connect
pub const DEFAULT_DB_INDEX: i64 = 0;

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Address
    // -------------------------------------------------------------------------
    /// Server hostname or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Database selected with `SELECT` right after the socket opens
    pub db_index: i64,

    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Connect timeout. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,

    /// Socket read timeout. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,

    /// Socket write timeout. `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,

    /// Disable Nagle's algorithm
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            db_index: DEFAULT_DB_INDEX,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string suitable for address resolution
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse a `redis://host[:port][/db]` URL
    ///
    /// Missing parts fall back to the defaults. Credentials and TLS schemes
    /// are not supported.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("redis://")
            .ok_or_else(|| RedwireError::Config(format!("unsupported URL scheme: {}", url)))?;

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        };

        if authority.contains('@') {
            return Err(RedwireError::Config(
                "credentials in URL are not supported".to_string(),
            ));
        }

        let mut config = Config::default();

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| RedwireError::Config(format!("invalid port: {}", port)))?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };

        if !host.is_empty() {
            config.host = host.to_string();
        }
        config.port = port;

        if !path.is_empty() {
            config.db_index = path
                .parse::<i64>()
                .map_err(|_| RedwireError::Config(format!("invalid database index: {}", path)))?;
        }

        Ok(config)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server hostname
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the database index selected on connect
    pub fn db_index(mut self, index: i64) -> Self {
        self.config.db_index = index;
        self
    }

    /// Set the connect timeout (in milliseconds, 0 disables it)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout = millis(ms);
        self
    }

    /// Set the read timeout (in milliseconds, 0 disables it)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout = millis(ms);
        self
    }

    /// Set the write timeout (in milliseconds, 0 disables it)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout = millis(ms);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

fn millis(ms: u64) -> Option<Duration> {
    if ms > 0 {
        Some(Duration::from_millis(ms))
    } else {
        None
    }
}
