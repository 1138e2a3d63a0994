//! Store abstraction layer for Data Insights.
//!
//! Provides a trait-based interface over the relational store so the query
//! gate can run against SQLite or an in-memory mock interchangeably.

mod mock;
mod schema;
mod seed;
mod sqlite;
mod types;

pub use mock::MockStore;
pub use schema::{Column, Schema, Table};
pub use seed::{create_sample_database, SeedOptions, SeedSummary, CUSTOMERS, PRODUCTS, REGIONS};
pub use sqlite::SqliteStore;
pub use types::{
    QueryResult, RawColumn, RawResultSet, RawValue, Row, SerializationFallback, Value,
};

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens the read-only store described by the configuration.
///
/// The returned handle is passed explicitly to whoever needs it; there is no
/// process-wide store.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn QueryStore>> {
    let store = SqliteStore::open(config).await?;
    Ok(Box::new(store))
}

/// Trait defining the interface for read-only stores.
///
/// `fetch_raw` reports store failures as [`crate::error::InsightsError::Query`]
/// carrying the store's own message.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Introspects the store schema: tables, columns and row counts.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Runs a single SQL statement, keeping at most `max_rows` rows.
    ///
    /// Rows past the bound are counted in [`RawResultSet::total_rows`] but
    /// never held.
    async fn fetch_raw(&self, sql: &str, max_rows: usize) -> Result<RawResultSet>;

    /// Closes the store.
    async fn close(&self) -> Result<()>;
}
