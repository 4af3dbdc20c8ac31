use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "STATICD_CONFIG";

/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub workers: usize,
    pub queue_capacity: usize,
    /// Longest silence tolerated between two reads. The whole request must
    /// arrive within twice this, counted from its first byte.
    pub idle_timeout_ms: u64,
    pub drain_timeout_ms: u64,
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "localhost:8080".to_string(),
            workers: 5,
            queue_capacity: 64,
            idle_timeout_ms: 5_000,
            drain_timeout_ms: 10_000,
            max_request_bytes: 64 * 1024,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Config {
    /// Loads the YAML file named by `STATICD_CONFIG` (defaults when unset),
    /// then applies the `LISTEN` override.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Loads `path` (defaults when `None`), then applies the `LISTEN`
    /// override.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if server.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        if server.idle_timeout_ms == 0 {
            return Err(ConfigError::Invalid("idle_timeout_ms must be positive".into()));
        }
        if server.max_request_bytes == 0 {
            return Err(ConfigError::Invalid("max_request_bytes must be positive".into()));
        }
        Ok(())
    }
}
