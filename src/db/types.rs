//! Query result types for Data Insights.
//!
//! Raw types ([`RawResultSet`], [`RawValue`]) carry what the store returned,
//! including store-specific storage classes. Shaped types ([`QueryResult`],
//! [`Value`]) are the bounded, closed-set form handed to callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column metadata as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawColumn {
    /// Column name.
    pub name: String,

    /// Declared type, or `NULL` for expressions.
    pub declared_type: String,
}

impl RawColumn {
    /// Creates a new raw column with the given name and declared type.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// A cell exactly as decoded from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// A storage class without a native mapping, decoded as text.
    Other { store_type: String, text: String },
    /// A cell the driver could not decode at all.
    Unreadable { store_type: String, message: String },
}

/// Result set straight from the store.
///
/// Stores keep at most the requested number of rows but count every row the
/// query produced in `total_rows`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    /// Column metadata, in select-list order.
    pub columns: Vec<RawColumn>,

    /// Rows kept, each aligned with `columns`.
    pub rows: Vec<Vec<RawValue>>,

    /// Rows the query produced, kept or not.
    pub total_rows: usize,
}

impl RawResultSet {
    /// Creates a raw result set holding every row the query produced.
    pub fn new(columns: Vec<RawColumn>, rows: Vec<Vec<RawValue>>) -> Self {
        let total_rows = rows.len();
        Self {
            columns,
            rows,
            total_rows,
        }
    }

    /// Records that the query produced `total_rows` rows in all.
    pub fn with_total_rows(mut self, total_rows: usize) -> Self {
        self.total_rows = total_rows.max(self.rows.len());
        self
    }

    /// Keeps the first `max_rows` rows; `total_rows` is unchanged.
    pub fn bounded(mut self, max_rows: usize) -> Self {
        self.rows.truncate(max_rows);
        self
    }
}

/// Represents a single shaped value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Finite floating point number.
    Float(f64),

    /// Text value, including coerced cells.
    String(String),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the value as a float if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// Converts the value to JSON for tool responses.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// A row of shaped values, aligned with [`QueryResult::columns`].
pub type Row = Vec<Value>;

/// Cells of one column that had to be coerced to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationFallback {
    /// Column the coerced cells belong to.
    pub column: String,

    /// Store type of the coerced cells.
    pub store_type: String,

    /// Number of coerced cells.
    pub cells: usize,
}

/// Bounded, serializable result of an allowed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names, in select-list order.
    pub columns: Vec<String>,

    /// Rows of data (at most the shaper's row bound).
    pub rows: Vec<Row>,

    /// Number of rows in `rows`.
    pub row_count: usize,

    /// Number of rows the store produced before truncation.
    pub total_rows: usize,

    /// Whether rows were dropped to respect the row bound.
    #[serde(default)]
    pub was_truncated: bool,

    /// Columns with cells coerced to text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<SerializationFallback>,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the value at the given row for the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Total number of cells coerced to text.
    pub fn coerced_cells(&self) -> usize {
        self.fallbacks.iter().map(|f| f.cells).sum()
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        self.was_truncated.then(|| {
            format!(
                "Result truncated: showing {} of {} rows",
                self.row_count, self.total_rows
            )
        })
    }

    /// Converts rows into JSON objects keyed by column name.
    ///
    /// Repeated column names get a numeric suffix (`total`, `total_2`) so no
    /// cell is lost.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let keys = unique_keys(&self.columns);
        self.rows
            .iter()
            .map(|row| {
                keys.iter()
                    .cloned()
                    .zip(row.iter().map(Value::to_json))
                    .collect()
            })
            .collect()
    }
}

fn unique_keys(columns: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let mut candidate = column.clone();
        let mut suffix = 2;
        while keys.contains(&candidate) {
            candidate = format!("{column}_{suffix}");
            suffix += 1;
        }
        keys.push(candidate);
    }
    keys
}
