//! The query gate.
//!
//! Every candidate string is untrusted. The gate validates it, runs allowed
//! text through the read-only store under a timeout, and shapes the rows.
//! Rejected text never reaches the store.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::shaper::shape;
use crate::config::GateConfig;
use crate::db::{QueryResult, QueryStore};
use crate::error::InsightsError;
use crate::safety::{validate_with, Rejection, ValidationMode, ValidationVerdict};

/// Why an execution attempt produced no result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Validation refused the text; the store was not contacted.
    #[error("Query rejected: {0}")]
    RejectedQuery(Rejection),

    /// The store reported a failure; the message is the store's own.
    #[error("{0}")]
    StoreError(String),

    /// The query did not finish within the configured bound.
    #[error("Query timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ExecutionError {
    /// Stable machine-readable label used at the tool boundary.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::RejectedQuery(_) => "rejected_query",
            Self::StoreError(_) => "store_error",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<ExecutionError> for InsightsError {
    fn from(error: ExecutionError) -> Self {
        InsightsError::query(error.to_string())
    }
}

/// Limits applied to every execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub mode: ValidationMode,
    pub timeout: Duration,
    pub max_rows: usize,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from(&GateConfig::default())
    }
}

impl From<&GateConfig> for GatePolicy {
    fn from(config: &GateConfig) -> Self {
        Self {
            mode: config.mode,
            timeout: config.query_timeout(),
            max_rows: config.max_rows,
        }
    }
}

/// Validation and execution boundary over a borrowed store.
///
/// Holds no state across calls; concurrent calls each take their own pooled
/// connection inside the store.
#[derive(Clone, Copy)]
pub struct QueryGate<'a> {
    store: &'a dyn QueryStore,
    policy: GatePolicy,
}

impl<'a> QueryGate<'a> {
    /// Creates a gate over the given store.
    pub fn new(store: &'a dyn QueryStore, policy: GatePolicy) -> Self {
        Self { store, policy }
    }

    /// Returns the policy in effect.
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Validates a candidate without touching the store.
    pub fn validate(&self, candidate: &str) -> ValidationVerdict {
        validate_with(self.policy.mode, candidate)
    }

    /// Validates, executes and shapes a candidate query.
    pub async fn execute(&self, candidate: &str) -> Result<QueryResult, ExecutionError> {
        debug!(state = "received", sql = %candidate, "Query received");

        if let ValidationVerdict::Rejected(reason) = self.validate(candidate) {
            warn!(state = "rejected", sql = %candidate, reason = %reason, "Query rejected");
            return Err(ExecutionError::RejectedQuery(reason));
        }
        debug!(state = "validated", mode = %self.policy.mode, "Query validated");

        let start = Instant::now();
        let fetch = self.store.fetch_raw(candidate, self.policy.max_rows);
        let fetched = tokio::time::timeout(self.policy.timeout, fetch)
            .await
            .map_err(|_| {
                warn!(state = "failed", timeout = ?self.policy.timeout, "Query timed out");
                ExecutionError::Timeout(self.policy.timeout)
            })?;

        let raw = fetched.map_err(|e| {
            let message = match e {
                InsightsError::Query(message) => message,
                other => other.to_string(),
            };
            warn!(state = "failed", error = %message, "Query failed");
            ExecutionError::StoreError(message)
        })?;

        let result = shape(raw, self.policy.max_rows);
        info!(
            state = "succeeded",
            rows = result.row_count,
            total_rows = result.total_rows,
            truncated = result.was_truncated,
            coerced_cells = result.coerced_cells(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(result)
    }
}
