//! Result shaping.
//!
//! Bounds a raw result set to a row limit and converts every cell into the
//! closed [`Value`] set. Shaping never fails: cells without a native mapping
//! become text and are tallied as [`SerializationFallback`] records.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::warn;

use crate::db::{QueryResult, RawResultSet, RawValue, SerializationFallback, Value};

/// Shapes a raw result set into at most `max_rows` rows.
pub fn shape(raw: RawResultSet, max_rows: usize) -> QueryResult {
    let RawResultSet {
        columns,
        rows,
        total_rows,
    } = raw;

    let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(columns.len());
    let column_names: Vec<String> = (0..width)
        .map(|i| match columns.get(i) {
            Some(column) => column.name.clone(),
            None => format!("column_{}", i + 1),
        })
        .collect();

    let total_rows = total_rows.max(rows.len());
    let was_truncated = total_rows > max_rows;
    if was_truncated {
        warn!(total_rows, max_rows, "Truncating query result");
    }

    let mut tally = FallbackTally::default();
    let shaped_rows: Vec<Vec<Value>> = rows
        .into_iter()
        .take(max_rows)
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(i, cell)| shape_cell(cell, i, &mut tally))
                .collect()
        })
        .collect();

    let fallbacks = tally.into_fallbacks(&column_names);
    let row_count = shaped_rows.len();

    QueryResult {
        columns: column_names,
        rows: shaped_rows,
        row_count,
        total_rows,
        was_truncated,
        fallbacks,
    }
}

fn shape_cell(cell: RawValue, column: usize, tally: &mut FallbackTally) -> Value {
    match cell {
        RawValue::Null => Value::Null,
        RawValue::Boolean(b) => Value::Bool(b),
        RawValue::Integer(i) => Value::Int(i),
        RawValue::Real(f) if f.is_finite() => Value::Float(f),
        RawValue::Real(f) => {
            tally.record(column, "REAL");
            Value::String(f.to_string())
        }
        RawValue::Text(s) => Value::String(s),
        RawValue::Blob(bytes) => {
            tally.record(column, "BLOB");
            Value::String(BASE64.encode(bytes))
        }
        RawValue::Other { store_type, text } => {
            tally.record(column, &store_type);
            Value::String(text)
        }
        RawValue::Unreadable {
            store_type,
            message,
        } => {
            tally.record(column, &store_type);
            Value::String(format!("<unreadable {store_type}: {message}>"))
        }
    }
}

/// Counts coerced cells per (column, store type), in first-seen order.
#[derive(Default)]
struct FallbackTally {
    entries: Vec<(usize, String, usize)>,
}

impl FallbackTally {
    fn record(&mut self, column: usize, store_type: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(c, t, _)| *c == column && t == store_type)
        {
            Some((_, _, cells)) => *cells += 1,
            None => self.entries.push((column, store_type.to_string(), 1)),
        }
    }

    fn into_fallbacks(self, column_names: &[String]) -> Vec<SerializationFallback> {
        self.entries
            .into_iter()
            .map(|(column, store_type, cells)| SerializationFallback {
                column: column_names
                    .get(column)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{}", column + 1)),
                store_type,
                cells,
            })
            .collect()
    }
}
