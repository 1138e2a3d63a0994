//! Configuration management for Data Insights.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Sections cover the SQLite store, the query gate and the LLM provider.

use crate::error::{InsightsError, Result};
use crate::safety::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Main configuration structure for Data Insights.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// SQLite store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Query gate settings.
    #[serde(default)]
    pub gate: GateConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Size of the read-only connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits on a locked database.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("sales_data.db")
}

fn default_max_connections() -> u32 {
    4
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Creates a store config for the given path with default pool settings.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Creates a store config from a path or a `sqlite:` URL.
    ///
    /// Accepted forms: `sqlite:///abs/path.db`, `sqlite://rel/path.db`,
    /// `sqlite:file.db` and plain filesystem paths.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        if !conn_str.contains("://") && !conn_str.starts_with("sqlite:") {
            return Ok(Self::with_path(conn_str));
        }

        let url = Url::parse(conn_str)
            .map_err(|e| InsightsError::config(format!("Invalid connection string: {e}")))?;

        if url.scheme() != "sqlite" {
            return Err(InsightsError::config(format!(
                "Invalid scheme '{}'. Expected 'sqlite'",
                url.scheme()
            )));
        }

        let path = match url.host_str().filter(|h| !h.is_empty()) {
            Some(host) => format!("{host}{}", url.path()),
            None => url.path().to_string(),
        };

        if path.is_empty() {
            return Err(InsightsError::config("Store path is required"));
        }

        Ok(Self::with_path(path))
    }

    /// Busy timeout as a duration.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Returns a display string for logs and the CLI.
    pub fn display_string(&self) -> String {
        format!(
            "{} (pool of {})",
            self.path.display(),
            self.max_connections
        )
    }
}

/// Query gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateConfig {
    /// Validation mode: "keyword" or "strict".
    #[serde(default)]
    pub mode: ValidationMode,

    /// Upper bound on a single query's execution time.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Maximum rows handed back per query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

fn default_query_timeout_secs() -> u64 {
    10
}

fn default_max_rows() -> usize {
    100
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            query_timeout_secs: default_query_timeout_secs(),
            max_rows: default_max_rows(),
        }
    }
}

impl GateConfig {
    /// Query timeout as a duration.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// LLM provider: "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "gpt-4", "gpt-4o-mini").
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// User turns kept in the conversation window.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_max_turns() -> usize {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_llm_timeout_secs(),
            max_turns: default_max_turns(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("data-insights")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InsightsError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            InsightsError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `INSIGHTS_DB_PATH` and `OPENAI_MODEL` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using the given variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("INSIGHTS_DB_PATH").filter(|v| !v.is_empty()) {
            self.store.path = StoreConfig::from_connection_string(&db_path)?.path;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.is_empty()) {
            self.llm.model = model;
        }
        Ok(())
    }
}
