//! Error types for Data Insights.
//!
//! Defines the main error enum used throughout the application. Errors raised
//! by the query gate itself live in [`crate::query::ExecutionError`] and convert
//! into [`InsightsError::Query`] when they cross into application code.

use thiserror::Error;

/// Main error type for Data Insights operations.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Store connection errors (missing file, permissions, pool exhaustion).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (rejected queries, store failures, timeouts).
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, malformed responses).
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad store URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sample data creation errors.
    #[error("Seed error: {0}")]
    Seed(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightsError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a seed error with the given message.
    pub fn seed(msg: impl Into<String>) -> Self {
        Self::Seed(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Seed(_) => "Seed Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using InsightsError.
pub type Result<T> = std::result::Result<T, InsightsError>;
