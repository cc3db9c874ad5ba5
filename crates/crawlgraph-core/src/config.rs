//! Configuration for hosts embedding crawlgraph.
//!
//! Values are layered with `figment`: built-in defaults, then an optional
//! `crawlgraph.toml`, then `CRAWLGRAPH_*` environment variables
//! (`CRAWLGRAPH_STORE__URL`, `CRAWLGRAPH_LOGGING__LEVEL`, ...). `REDIS_URL`
//! is honoured as a fallback store URL.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "crawlgraph.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlGraphConfig {
    /// Remote store connection settings.
    pub store: StoreConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`.
    pub url: String,
    /// Maximum number of idle pooled connections.
    pub max_idle: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/".to_string(),
            max_idle: 8,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `crawlgraph_core=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Installs a global `tracing` subscriber honouring `level`, unless one is
    /// already installed. `RUST_LOG` wins over `level` when set.
    pub fn init_subscriber(&self) -> Result<()> {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| Error::Config(format!("invalid log level '{}': {e}", self.level)))?;

        // A host may have installed its own subscriber already; that is fine.
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        Ok(())
    }
}

impl CrawlGraphConfig {
    /// Loads configuration from defaults, `crawlgraph.toml` in the working
    /// directory (if present) and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Loads configuration from defaults, the TOML file at `path` (if present)
    /// and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path.as_ref()))
    }

    /// Builds the layered provider chain without extracting it.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Ok(url) = std::env::var("REDIS_URL") {
            figment = figment.merge(Serialized::default("store.url", url));
        }
        figment
            .merge(Toml::file(path))
            .merge(Env::prefixed("CRAWLGRAPH_").split("__"))
    }

    /// Extracts and validates a configuration from `figment`.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values figment cannot check by type alone.
    pub fn validate(&self) -> Result<()> {
        if self.store.url.trim().is_empty() {
            return Err(Error::Config("store.url must not be empty".to_string()));
        }
        if self.store.max_idle == 0 {
            return Err(Error::Config("store.max_idle must be at least 1".to_string()));
        }
        Ok(())
    }
}
