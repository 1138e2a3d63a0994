//! Read-only store tests.

use data_insights::config::StoreConfig;
use data_insights::db::{self, RawValue};
use data_insights::error::InsightsError;
use tempfile::TempDir;

use super::seed_in;

#[tokio::test]
async fn test_connect_missing_store_suggests_seed() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::with_path(dir.path().join("missing.db"));

    let err = db::connect(&config).await.err().unwrap();
    assert!(matches!(err, InsightsError::Connection(_)));
    assert!(err.to_string().contains("insights seed"));
}

#[tokio::test]
async fn test_connect_from_url() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;
    let url = format!("sqlite://{}", path.display());

    let config = StoreConfig::from_connection_string(&url).unwrap();
    let store = db::connect(&config).await.unwrap();

    let raw = store
        .fetch_raw("SELECT COUNT(*) FROM customers", 100)
        .await
        .unwrap();
    assert_eq!(raw.rows, vec![vec![RawValue::Integer(20)]]);
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_overview_lists_tables() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;
    let store = db::connect(&StoreConfig::with_path(path)).await.unwrap();

    let overview = store.introspect_schema().await.unwrap().format_overview();
    assert!(overview.contains("customers (20 rows): id, name, region"));
    assert!(overview.contains("sales (600 rows): id, date, customer"));
}
