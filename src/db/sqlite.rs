//! SQLite store implementation.
//!
//! Provides the `SqliteStore` struct that implements the `QueryStore` trait.
//! Connections are opened read-only with `query_only` switched on, so the
//! store refuses writes even for text that slipped past validation.

use crate::config::StoreConfig;
use crate::db::{Column, QueryStore, RawColumn, RawResultSet, RawValue, Schema, Table};
use crate::error::{InsightsError, Result};
use crate::safety::statement_count;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How long a call may wait for a free pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Read-only SQLite store.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens a read-only pool over an existing SQLite file.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        if !config.path.exists() {
            return Err(InsightsError::connection(format!(
                "Store not found at {}. Run `insights seed` to create it.",
                config.path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(config.busy_timeout())
            .pragma("query_only", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| map_connection_error(e, &config.path))?;

        debug!(store = %config.display_string(), "Opened read-only store");
        Ok(Self { pool })
    }

    /// Fetches user table names in alphabetical order.
    async fn fetch_table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| InsightsError::query(format!("Failed to fetch tables: {e}")))
    }

    /// Fetches columns and primary key for a specific table.
    async fn fetch_columns(&self, table_name: &str) -> Result<(Vec<Column>, Vec<String>)> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(table_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            InsightsError::query(format!("Failed to fetch columns for {table_name}: {e}"))
        })?;

        let mut key_columns: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        key_columns.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| Column {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok((columns, key_columns.into_iter().map(|(_, n)| n).collect()))
    }

    /// Counts rows in a table.
    async fn fetch_row_count(&self, table_name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name));
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| InsightsError::query(format!("Failed to count rows in {table_name}: {e}")))
    }
}

#[async_trait]
impl QueryStore for SqliteStore {
    async fn introspect_schema(&self) -> Result<Schema> {
        let mut tables = Vec::new();

        for name in self.fetch_table_names().await? {
            let (columns, primary_key) = self.fetch_columns(&name).await?;
            let row_count = self.fetch_row_count(&name).await?;
            tables.push(Table {
                name,
                columns,
                primary_key,
                row_count,
            });
        }

        Ok(Schema { tables })
    }

    async fn fetch_raw(&self, sql: &str, max_rows: usize) -> Result<RawResultSet> {
        // SQLite would run every statement in the text, side effects included.
        let statements = statement_count(sql);
        if statements > 1 {
            return Err(InsightsError::query(format!(
                "multiple statements are not allowed ({statements} found); send one query per call"
            )));
        }

        // One connection per call, returned to the pool when dropped.
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| InsightsError::connection(format!("Failed to acquire connection: {e}")))?;

        let mut columns: Option<Vec<RawColumn>> = None;
        let mut rows = Vec::new();
        let mut total_rows = 0usize;

        {
            let mut stream = sqlx::query(sql).persistent(false).fetch(&mut *conn);
            while let Some(row) = stream
                .try_next()
                .await
                .map_err(|e| InsightsError::query(format_store_error(&e)))?
            {
                let raw_columns = columns.get_or_insert_with(|| raw_columns(&row));
                if rows.len() < max_rows {
                    rows.push(convert_row(&row, raw_columns));
                }
                total_rows += 1;
            }
        }

        let columns = match columns {
            Some(columns) => columns,
            // No rows: fall back to statement metadata for column names.
            None => match (&mut *conn).prepare(sql).await {
                Ok(statement) => statement
                    .columns()
                    .iter()
                    .map(|col| RawColumn::new(col.name(), col.type_info().name()))
                    .collect(),
                Err(e) => {
                    debug!(error = %e, "Could not describe empty result");
                    Vec::new()
                }
            },
        };

        Ok(RawResultSet::new(columns, rows).with_total_rows(total_rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn raw_columns(row: &SqliteRow) -> Vec<RawColumn> {
    row.columns()
        .iter()
        .map(|col| RawColumn::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to raw values.
fn convert_row(row: &SqliteRow, columns: &[RawColumn]) -> Vec<RawValue> {
    (0..row.len())
        .map(|i| {
            let declared = columns.get(i).map(|c| c.declared_type.as_str()).unwrap_or("");
            convert_value(row, i, declared)
        })
        .collect()
}

/// Converts a single cell, dispatching on its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize, declared_type: &str) -> RawValue {
    let storage_class = match row.try_get_raw(index) {
        Ok(value) if value.is_null() => return RawValue::Null,
        Ok(value) => value.type_info().name().to_uppercase(),
        Err(e) => {
            return RawValue::Unreadable {
                store_type: declared_type.to_string(),
                message: e.to_string(),
            }
        }
    };

    let decoded = match storage_class.as_str() {
        "INTEGER" => row.try_get_unchecked::<i64, _>(index).map(|v| {
            if is_boolean_type(declared_type) && (v == 0 || v == 1) {
                RawValue::Boolean(v == 1)
            } else {
                RawValue::Integer(v)
            }
        }),
        "REAL" => row.try_get_unchecked::<f64, _>(index).map(RawValue::Real),
        "TEXT" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(|bytes| match String::from_utf8(bytes) {
                Ok(text) => RawValue::Text(text),
                Err(e) => RawValue::Other {
                    store_type: storage_class.clone(),
                    text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                },
            }),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(RawValue::Blob),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(|text| RawValue::Other {
                store_type: storage_class.clone(),
                text,
            }),
    };

    decoded.unwrap_or_else(|e| RawValue::Unreadable {
        store_type: storage_class,
        message: e.to_string(),
    })
}

fn is_boolean_type(declared_type: &str) -> bool {
    matches!(declared_type.to_uppercase().as_str(), "BOOLEAN" | "BOOL")
}

/// Quotes an identifier for interpolation into SQL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns the store's own message for database errors, or the driver message.
pub(crate) fn format_store_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

/// Maps sqlx connection errors to user-facing messages.
fn map_connection_error(error: sqlx::Error, path: &Path) -> InsightsError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("unable to open") {
        InsightsError::connection(format!(
            "Cannot open store at {}. Check the path and file permissions.",
            path.display()
        ))
    } else if error_str.contains("not a database") {
        InsightsError::connection(format!("{} is not a SQLite database.", path.display()))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        InsightsError::connection(format!(
            "Timed out opening store at {}. Another process may hold a lock.",
            path.display()
        ))
    } else {
        InsightsError::connection(error.to_string())
    }
}
