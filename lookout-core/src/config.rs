//! Configuration for lookout
//!
//! Supports layered configuration: defaults → file → env overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::broadcast::DEFAULT_SUBSCRIBER_BUFFER;
use crate::types::{AdapterHealth, AdapterRecord};

/// Config file probed in the working directory when `LOOKOUT_CONFIG` is
/// not set.
pub const DEFAULT_CONFIG_PATH: &str = "lookout.toml";

/// Complete configuration for lookout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub exec: ExecConfig,
    pub adapters: Vec<AdapterSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            feed: FeedConfig::default(),
            exec: ExecConfig::default(),
            adapters: default_adapters(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Synthetic log feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Seconds between feed lines.
    pub interval_secs: u64,
    /// Per-subscriber event buffer.
    pub subscriber_buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}

/// Execution endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Adapter credited with the traffic of the execution endpoints.
    pub adapter: String,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            adapter: "ollama".to_string(),
        }
    }
}

/// Seed row for one monitored adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSeed {
    pub name: String,
    #[serde(default)]
    pub status: AdapterHealth,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub errors: u64,
}

impl AdapterSeed {
    pub fn record(&self) -> AdapterRecord {
        AdapterRecord::new(self.status, self.latency_ms, self.requests, self.errors)
    }
}

fn default_adapters() -> Vec<AdapterSeed> {
    vec![
        AdapterSeed {
            name: "ollama".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 45,
            requests: 1247,
            errors: 0,
        },
        AdapterSeed {
            name: "deepseek".to_string(),
            status: AdapterHealth::Warning,
            latency_ms: 120,
            requests: 892,
            errors: 3,
        },
        AdapterSeed {
            name: "local_llm".to_string(),
            status: AdapterHealth::Error,
            latency_ms: 0,
            requests: 0,
            errors: 15,
        },
    ]
}

impl Config {
    /// Load configuration from all sources with proper layering
    /// Order: defaults → `LOOKOUT_CONFIG` file OR `./lookout.toml` → env vars
    pub async fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var("LOOKOUT_CONFIG").ok().map(PathBuf::from) {
            Some(path) => Some(path),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                tokio::fs::try_exists(&fallback)
                    .await
                    .unwrap_or(false)
                    .then_some(fallback)
            }
        };
        Self::load_from_with_env(path.as_deref(), |key| std::env::var(key).ok()).await
    }

    /// Load config like [`Config::load`], but with an explicit file path and
    /// environment variable provider.
    ///
    /// This exists primarily to make tests deterministic without mutating the
    /// process-wide environment (which is unsafe in multi-threaded programs
    /// on Unix).
    #[doc(hidden)]
    pub async fn load_from_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = path {
            config.merge_file(path).await?;
        }

        config.apply_env_overrides_from(env)?;
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a TOML file
    pub async fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;

        let file_config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;

        // Merge (file values override defaults)
        self.merge(file_config);

        Ok(())
    }

    /// Merge another config into this one
    fn merge(&mut self, other: Config) {
        if other.server != ServerConfig::default() {
            self.server = other.server;
        }
        if other.feed != FeedConfig::default() {
            self.feed = other.feed;
        }
        if other.exec != ExecConfig::default() {
            self.exec = other.exec;
        }
        if other.adapters != default_adapters() {
            self.adapters = other.adapters;
        }
    }

    /// Apply environment variable overrides using an explicit env provider.
    ///
    /// This exists primarily to make tests deterministic without mutating the
    /// process-wide environment (which is unsafe in multi-threaded programs
    /// on Unix).
    #[doc(hidden)]
    pub fn apply_env_overrides_from<F>(&mut self, mut env: F) -> Result<(), ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(host) = env("LOOKOUT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env("LOOKOUT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("LOOKOUT_PORT: {port}")))?;
        }
        if let Some(secs) = env("LOOKOUT_FEED_INTERVAL_SECS") {
            self.feed.interval_secs = secs.parse().map_err(|_| {
                ConfigError::InvalidValue(format!("LOOKOUT_FEED_INTERVAL_SECS: {secs}"))
            })?;
        }

        Ok(())
    }

    /// Reject configurations the runtime cannot start with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.adapters.is_empty() {
            return Err(ConfigError::MissingField("adapters".to_string()));
        }
        for (index, seed) in self.adapters.iter().enumerate() {
            if seed.name.is_empty() {
                return Err(ConfigError::MissingField(format!("adapters[{index}].name")));
            }
            if self.adapters[..index].iter().any(|prev| prev.name == seed.name) {
                return Err(ConfigError::InvalidValue(format!(
                    "adapters: duplicate name {}",
                    seed.name
                )));
            }
        }
        if !self.adapters.iter().any(|seed| seed.name == self.exec.adapter) {
            return Err(ConfigError::InvalidValue(format!(
                "exec.adapter: {} is not a configured adapter",
                self.exec.adapter
            )));
        }
        if self.feed.interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "feed.interval_secs: must be at least 1".to_string(),
            ));
        }
        if self.feed.subscriber_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "feed.subscriber_buffer: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seed pairs for [`crate::registry::MetricsRegistry::new`].
    pub fn adapter_records(&self) -> impl Iterator<Item = (String, AdapterRecord)> + '_ {
        self.adapters
            .iter()
            .map(|seed| (seed.name.clone(), seed.record()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
