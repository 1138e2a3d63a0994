//! AST-based read-only check used by strict validation.
//!
//! Uses sqlparser-rs with the SQLite dialect. The candidate must parse into
//! exactly one query statement, and no CTE, derived table or set operation
//! inside it may carry a data-modifying statement.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::Rejection;

/// Parses the candidate and checks that it is a single read-only query.
pub fn check_single_read_statement(sql: &str) -> std::result::Result<(), Rejection> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql)
        .map_err(|e| Rejection::Unparseable(e.to_string()))?;

    match statements.as_slice() {
        [Statement::Query(query)] if query_is_read_only(query) => Ok(()),
        _ => Err(Rejection::NotSingleReadStatement),
    }
}

/// Checks the WITH clause and body of a query.
fn query_is_read_only(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map(|with| with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)))
        .unwrap_or(true);

    ctes_read_only && set_expr_is_read_only(&query.body)
}

/// Checks a query body, recursing into nested queries and set operations.
fn set_expr_is_read_only(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(select) => select_is_read_only(select),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        // INSERT, UPDATE and any other statement-bearing body
        _ => false,
    }
}

/// Checks the FROM clause of a SELECT for derived tables.
fn select_is_read_only(select: &Select) -> bool {
    select.from.iter().all(table_with_joins_is_read_only)
}

fn table_with_joins_is_read_only(twj: &TableWithJoins) -> bool {
    table_factor_is_read_only(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| table_factor_is_read_only(&join.relation))
}

fn table_factor_is_read_only(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => query_is_read_only(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_is_read_only(table_with_joins),
        // Plain tables and table-valued functions
        _ => true,
    }
}
