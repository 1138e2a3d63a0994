//! Command-line argument parsing for Data Insights.

use crate::config::{Config, StoreConfig};
use crate::error::{InsightsError, Result};
use crate::llm::LlmProvider;
use crate::safety::ValidationMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ask questions about a SQLite sales database in plain language.
#[derive(Parser, Debug)]
#[command(name = "insights")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path or sqlite:// URL
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<String>,

    /// Write logs to a file instead of stderr (empty value uses the default location)
    #[arg(long, value_name = "PATH", global = true, num_args = 0..=1, default_missing_value = "")]
    pub log_file: Option<String>,

    /// LLM provider to use (openai or mock)
    #[arg(long, value_name = "PROVIDER", global = true)]
    pub llm: Option<String>,

    /// Query validation mode (keyword or strict)
    #[arg(long, value_name = "MODE", global = true)]
    pub mode: Option<String>,

    /// Maximum rows returned per query
    #[arg(long, value_name = "N", global = true)]
    pub max_rows: Option<usize>,

    /// Query timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the sample sales database
    Seed {
        /// Replace an existing database file
        #[arg(long)]
        force: bool,

        /// Number of sales rows to generate
        #[arg(long, value_name = "N", default_value_t = 600)]
        rows: usize,

        /// Random seed for the generated data
        #[arg(long, value_name = "SEED", default_value_t = 42)]
        seed: u64,
    },

    /// List tables with their columns and row counts
    Tables,

    /// Validate a query without running it
    Check {
        /// SQL to validate
        sql: String,
    },

    /// Run a query through the gate and print the tool JSON
    Query {
        /// SQL to run
        sql: String,
    },

    /// Ask a single question
    Ask {
        /// Question in plain language
        question: String,
    },

    /// Start an interactive conversation
    Chat,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the log file to write to, if file logging was requested.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file.as_ref().map(|path| {
            if path.is_empty() {
                crate::logging::get_log_path()
            } else {
                PathBuf::from(path)
            }
        })
    }

    /// Applies command-line overrides on top of file and environment config.
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(db) = &self.db {
            config.store.path = StoreConfig::from_connection_string(db)?.path;
        }
        if let Some(llm) = &self.llm {
            let provider: LlmProvider = llm.parse().map_err(InsightsError::config)?;
            config.llm.provider = provider.as_str().to_string();
        }
        if let Some(mode) = &self.mode {
            config.gate.mode = mode.parse::<ValidationMode>().map_err(InsightsError::config)?;
        }
        if let Some(max_rows) = self.max_rows {
            if max_rows == 0 {
                return Err(InsightsError::config("--max-rows must be at least 1"));
            }
            config.gate.max_rows = max_rows;
        }
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err(InsightsError::config("--timeout must be at least 1 second"));
            }
            config.gate.query_timeout_secs = timeout;
        }
        Ok(())
    }
}
