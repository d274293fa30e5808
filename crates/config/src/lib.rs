//! Blockview Configuration Module
//!
//! This module provides the configuration types shared by the snapshot
//! provider daemon and the polling client.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default HTTP port of the provider
pub const DEFAULT_PORT: u16 = 8080;
/// Default SQLite database file
pub const DEFAULT_DB_PATH: &str = "blockview.db";
/// Table holding the persisted snapshots
pub const SNAPSHOT_TABLE: &str = "blockchain_data";

/// Pool limits
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

/// Time between successive fetch issuances (one minute)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;
/// Default endpoint of the provider as seen from a viewer
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    /// Creates an invalid-value error.
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// HTTP server configuration of the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            cors_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Socket address the provider listens on.
    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Datastore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path
    pub path: PathBuf,
    /// Number of pooled connections
    pub max_connections: usize,
    /// How long a request waits for a pooled connection
    pub acquire_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Polling client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Base URL of the provider
    pub endpoint: String,
    /// Time between successive fetch issuances
    pub interval_ms: u64,
    /// Per-fetch timeout; three quarters of the interval when unset
    pub timeout_ms: Option<u64>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: None,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Effective per-fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        let millis = self
            .timeout_ms
            .unwrap_or_else(|| self.interval_ms.saturating_mul(3) / 4);
        Duration::from_millis(millis)
    }

    /// A fetch must give up before the next one is issued, otherwise a hung
    /// upstream accumulates in-flight requests.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("poller endpoint cannot be empty"));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::invalid("poll interval must be positive"));
        }
        let timeout = self.fetch_timeout();
        if timeout.is_zero() || timeout >= self.interval() {
            return Err(ConfigError::invalid(format!(
                "fetch timeout ({} ms) must be positive and shorter than the poll interval ({} ms)",
                timeout.as_millis(),
                self.interval_ms
            )));
        }
        Ok(())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockviewConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub poller: PollerConfig,
}

impl BlockviewConfig {
    /// Loads the configuration file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("store path cannot be empty"));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::invalid(
                "store max_connections must be at least 1",
            ));
        }
        self.poller.validate()
    }
}
