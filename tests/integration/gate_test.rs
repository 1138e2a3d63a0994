//! Query gate tests against the sample store.

use std::collections::BTreeSet;
use std::time::Duration;

use data_insights::config::StoreConfig;
use data_insights::db::{QueryStore, SqliteStore, Value};
use data_insights::query::{ExecutionError, GatePolicy, QueryGate};
use data_insights::safety::{Rejection, ValidationMode};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::{seed_in, seeded_store};

#[tokio::test]
async fn test_delete_is_rejected_and_data_survives() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let err = gate.execute("DELETE FROM sales").await.unwrap_err();
    assert_eq!(
        err,
        ExecutionError::RejectedQuery(Rejection::ForbiddenKeyword("DELETE"))
    );
    assert_eq!(err.to_string(), "Query rejected: forbidden keyword: DELETE");

    let count = gate.execute("SELECT COUNT(*) AS n FROM sales").await.unwrap();
    assert_eq!(count.value(0, "n"), Some(&Value::Int(600)));
}

#[tokio::test]
async fn test_group_by_product_returns_rows() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let result = gate
        .execute(
            "SELECT product, SUM(total_amount) AS revenue FROM sales GROUP BY product ORDER BY revenue DESC",
        )
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["product", "revenue"]);
    assert!(result.row_count > 0);
    assert!(result.row_count <= 24);
    assert!(!result.was_truncated);
    assert!(result.rows[0][0].as_str().is_some());
    assert!(result.rows[0][1].as_f64().is_some());
}

#[tokio::test]
async fn test_group_by_product_one_row_per_product() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let distinct = gate
        .execute("SELECT COUNT(DISTINCT product) AS n FROM sales")
        .await
        .unwrap();
    let Some(&Value::Int(products)) = distinct.value(0, "n") else {
        panic!("expected an integer count");
    };

    let result = gate
        .execute("SELECT product, SUM(total_amount) FROM sales GROUP BY product")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["product", "SUM(total_amount)"]);
    assert_eq!(result.row_count as i64, products);
    assert!(!result.was_truncated);
    let names: BTreeSet<&str> = result.rows.iter().filter_map(|r| r[0].as_str()).collect();
    assert_eq!(names.len(), result.row_count);
}

#[tokio::test]
async fn test_missing_table_reports_store_message() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let err = gate
        .execute("SELECT * FROM nonexistent_table")
        .await
        .unwrap_err();

    assert_eq!(err.error_kind(), "store_error");
    assert!(err.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_repeated_query_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let sql = "SELECT region, COUNT(*) AS sales FROM sales GROUP BY region ORDER BY region";
    let first = gate.execute(sql).await.unwrap();
    let second = gate.execute(sql).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_large_result_is_truncated() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let result = gate.execute("SELECT * FROM sales").await.unwrap();

    assert_eq!(result.row_count, 100);
    assert_eq!(result.rows.len(), 100);
    assert_eq!(result.total_rows, 600);
    assert!(result.was_truncated);
    assert_eq!(
        result.truncation_warning().as_deref(),
        Some("Result truncated: showing 100 of 600 rows")
    );
}

#[tokio::test]
async fn test_store_refuses_writes_that_skip_validation() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;

    assert!(store.fetch_raw("DELETE FROM sales", 100).await.is_err());
    assert!(store
        .fetch_raw("CREATE TABLE scratch (id INTEGER)", 100)
        .await
        .is_err());

    let gate = QueryGate::new(&store, GatePolicy::default());
    let count = gate.execute("SELECT COUNT(*) AS n FROM sales").await.unwrap();
    assert_eq!(count.value(0, "n"), Some(&Value::Int(600)));
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let (sales, customers, rejected) = futures::join!(
        gate.execute("SELECT COUNT(*) AS n FROM sales"),
        gate.execute("SELECT COUNT(*) AS n FROM customers"),
        gate.execute("DROP TABLE customers"),
    );

    assert_eq!(sales.unwrap().value(0, "n"), Some(&Value::Int(600)));
    assert_eq!(customers.unwrap().value(0, "n"), Some(&Value::Int(20)));
    assert_eq!(rejected.unwrap_err().error_kind(), "rejected_query");
}

#[tokio::test]
async fn test_strict_mode_on_real_store() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let policy = GatePolicy {
        mode: ValidationMode::Strict,
        timeout: Duration::from_secs(5),
        max_rows: 10,
    };
    let gate = QueryGate::new(&store, policy);

    let result = gate
        .execute("SELECT name, total_spent FROM customers ORDER BY total_spent DESC")
        .await
        .unwrap();
    assert_eq!(result.row_count, 10);
    assert_eq!(result.total_rows, 20);

    let err = gate.execute("SELECT 1; SELECT 2").await.unwrap_err();
    assert_eq!(err.error_kind(), "rejected_query");
}

#[tokio::test]
async fn test_cross_join_is_bounded_while_streaming() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;

    let raw = store
        .fetch_raw("SELECT a.id, b.id FROM sales a, sales b", 100)
        .await
        .unwrap();
    assert_eq!(raw.rows.len(), 100);
    assert_eq!(raw.total_rows, 360_000);

    let gate = QueryGate::new(&store, GatePolicy::default());
    let result = gate
        .execute("SELECT a.id, b.id FROM sales a, sales b")
        .await
        .unwrap();
    assert_eq!(result.row_count, 100);
    assert_eq!(result.total_rows, 360_000);
    assert!(result.was_truncated);
}

#[tokio::test]
async fn test_second_statement_is_refused_before_running() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let err = gate
        .execute("SELECT 1 AS a; SELECT contact_email AS email, name FROM customers LIMIT 2")
        .await
        .unwrap_err();
    assert_eq!(err.error_kind(), "store_error");
    assert!(err.to_string().contains("multiple statements"));

    let copy = dir.path().join("exfiltrated.db");
    let vacuum = format!("SELECT 1; VACUUM INTO '{}'", copy.display());
    assert!(gate.validate(&vacuum).is_allowed());
    let err = gate.execute(&vacuum).await.unwrap_err();
    assert_eq!(err.error_kind(), "store_error");
    assert!(!copy.exists());
}

#[tokio::test]
async fn test_invalid_utf8_text_is_coerced() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&dir).await;
    let gate = QueryGate::new(&store, GatePolicy::default());

    let result = gate
        .execute("SELECT CAST(x'41ff42' AS TEXT) AS t")
        .await
        .unwrap();
    assert_eq!(result.value(0, "t"), Some(&Value::from("A\u{FFFD}B")));
    assert_eq!(result.coerced_cells(), 1);
}

#[tokio::test]
async fn test_slow_query_times_out_and_connection_is_reused() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;
    let config = StoreConfig {
        max_connections: 1,
        ..StoreConfig::with_path(path)
    };
    let store = SqliteStore::open(&config).await.unwrap();

    let hasty = QueryGate::new(
        &store,
        GatePolicy {
            timeout: Duration::from_millis(50),
            ..GatePolicy::default()
        },
    );
    let err = hasty
        .execute("SELECT a.id FROM sales a, sales b, sales c")
        .await
        .unwrap_err();
    assert_eq!(err, ExecutionError::Timeout(Duration::from_millis(50)));
    assert_eq!(err.error_kind(), "timeout");

    // The only pooled connection must come back for the next call.
    let gate = QueryGate::new(&store, GatePolicy::default());
    let result = gate.execute("SELECT 1 AS one").await.unwrap();
    assert_eq!(result.value(0, "one"), Some(&Value::Int(1)));
}
