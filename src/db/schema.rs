//! Database schema types for Data Insights.
//!
//! Represents the structure of the store: tables, their columns and row counts.

use serde::{Deserialize, Serialize};

/// Represents the complete schema of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// All user tables, ordered by name.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table with the given name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema for inclusion in an LLM system prompt.
    pub fn format_for_llm(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(format_table_for_llm)
            .collect::<Vec<_>>()
            .join("");

        format!("Database Schema:\n\n{}", tables_text)
    }

    /// Formats a one-line-per-table overview with row counts.
    pub fn format_overview(&self) -> String {
        self.tables
            .iter()
            .map(|table| {
                let columns = table
                    .columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} ({} rows): {}\n", table.name, table.row_count, columns)
            })
            .collect()
    }
}

fn format_table_for_llm(table: &Table) -> String {
    let column_lines = table
        .columns
        .iter()
        .map(|column| format_column_line(table, column))
        .collect::<Vec<_>>()
        .join("");

    format!("Table: {}\n{}\n", table.name, column_lines)
}

fn format_column_line(table: &Table, column: &Column) -> String {
    let annotations = [
        table.primary_key.contains(&column.name).then_some("PK"),
        (!column.is_nullable).then_some("NOT NULL"),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    let data_type = if column.data_type.is_empty() {
        "ANY"
    } else {
        column.data_type.as_str()
    };

    match (annotations.is_empty(), &column.default) {
        (false, Some(default)) => format!(
            "  - {}: {} ({}, DEFAULT {})\n",
            column.name, data_type, annotations, default
        ),
        (false, None) => format!("  - {}: {} ({})\n", column.name, data_type, annotations),
        (true, Some(default)) => {
            format!("  - {}: {} (DEFAULT {})\n", column.name, data_type, default)
        }
        (true, None) => format!("  - {}: {}\n", column.name, data_type),
    }
}

/// Represents a table in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,

    /// Primary key column names.
    pub primary_key: Vec<String>,

    /// Number of rows at introspection time.
    pub row_count: i64,
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type (may be empty in SQLite).
    pub data_type: String,

    /// Whether the column accepts NULL.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a nullable column without a default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> Schema {
        Schema {
            tables: vec![Table {
                name: "sales".to_string(),
                columns: vec![
                    Column {
                        is_nullable: false,
                        ..Column::new("id", "INTEGER")
                    },
                    Column {
                        is_nullable: false,
                        ..Column::new("product", "TEXT")
                    },
                    Column {
                        default: Some("CURRENT_TIMESTAMP".to_string()),
                        ..Column::new("created_at", "TEXT")
                    },
                    Column::new("note", ""),
                ],
                primary_key: vec!["id".to_string()],
                row_count: 600,
            }],
        }
    }

    #[test]
    fn test_format_for_llm() {
        let text = sample_schema().format_for_llm();
        assert_eq!(
            text,
            "Database Schema:\n\n\
             Table: sales\n\
             \x20 - id: INTEGER (PK, NOT NULL)\n\
             \x20 - product: TEXT (NOT NULL)\n\
             \x20 - created_at: TEXT (DEFAULT CURRENT_TIMESTAMP)\n\
             \x20 - note: ANY\n\n"
        );
    }

    #[test]
    fn test_format_overview() {
        let text = sample_schema().format_overview();
        assert_eq!(text, "sales (600 rows): id, product, created_at, note\n");
    }

    #[test]
    fn test_table_lookup() {
        let schema = sample_schema();
        assert!(schema.table("sales").is_some());
        assert!(schema.table("customers").is_none());
    }
}
