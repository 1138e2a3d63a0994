//! Mock store for testing.
//!
//! Returns canned results, counts calls, and can be made slow or failing so
//! gate behavior can be checked without a real database.

use super::{QueryStore, RawColumn, RawResultSet, RawValue, Schema};
use crate::error::{InsightsError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A mock store that returns predefined results.
pub struct MockStore {
    schema: Schema,
    result: RawResultSet,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_sql: Mutex<Option<String>>,
}

impl MockStore {
    /// Creates a mock store returning a single `result` column.
    pub fn new() -> Self {
        Self {
            schema: Schema::default(),
            result: RawResultSet::new(
                vec![RawColumn::new("result", "TEXT")],
                vec![vec![RawValue::Text("mock".to_string())]],
            ),
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        }
    }

    /// Sets the result returned for every query.
    pub fn with_result(mut self, result: RawResultSet) -> Self {
        self.result = result;
        self
    }

    /// Sets the schema returned by introspection.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Makes every query fail with the given store message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Delays every query by the given duration.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of queries that reached the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent query text that reached the store.
    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryStore for MockStore {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn fetch_raw(&self, sql: &str, max_rows: usize) -> Result<RawResultSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_sql.lock() {
            *guard = Some(sql.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(message) => Err(InsightsError::query(message.clone())),
            None => Ok(self.result.clone().bounded(max_rows)),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
