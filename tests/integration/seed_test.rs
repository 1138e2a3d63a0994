//! Sample store creation tests.

use data_insights::config::StoreConfig;
use data_insights::db::{
    create_sample_database, QueryStore, RawValue, SeedOptions, SqliteStore, CUSTOMERS, PRODUCTS,
    REGIONS,
};
use data_insights::error::InsightsError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::seed_in;

#[tokio::test]
async fn test_seed_creates_both_tables() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;
    let store = SqliteStore::open(&StoreConfig::with_path(path)).await.unwrap();

    let schema = store.introspect_schema().await.unwrap();
    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "sales"]);

    let sales = schema.table("sales").unwrap();
    assert_eq!(sales.row_count, 600);
    assert_eq!(sales.primary_key, vec!["id"]);
    assert_eq!(schema.table("customers").unwrap().row_count, CUSTOMERS.len() as i64);
}

#[tokio::test]
async fn test_seed_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.db");

    let summary = create_sample_database(&SeedOptions::new(&path)).await.unwrap();

    assert_eq!(summary.path, path);
    assert_eq!(summary.sales_rows, 600);
    assert_eq!(summary.customers, 20);
    assert!(path.exists());
}

#[tokio::test]
async fn test_seed_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;

    let err = create_sample_database(&SeedOptions::new(&path))
        .await
        .unwrap_err();
    assert!(matches!(err, InsightsError::Seed(_)));
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_seed_force_recreates() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;

    let options = SeedOptions {
        sales_rows: 25,
        force: true,
        ..SeedOptions::new(&path)
    };
    create_sample_database(&options).await.unwrap();

    let store = SqliteStore::open(&StoreConfig::with_path(path)).await.unwrap();
    let schema = store.introspect_schema().await.unwrap();
    assert_eq!(schema.table("sales").unwrap().row_count, 25);
}

#[tokio::test]
async fn test_same_seed_same_data() {
    let dir = TempDir::new().unwrap();
    let sql = "SELECT date, customer, product, quantity, total_amount FROM sales ORDER BY id";

    let mut snapshots = Vec::new();
    for name in ["a.db", "b.db"] {
        let path = dir.path().join(name);
        create_sample_database(&SeedOptions::new(&path)).await.unwrap();
        let store = SqliteStore::open(&StoreConfig::with_path(path)).await.unwrap();
        snapshots.push(store.fetch_raw(sql, 1_000).await.unwrap());
        store.close().await.unwrap();
    }

    assert_eq!(snapshots[0], snapshots[1]);
}

#[tokio::test]
async fn test_seeded_values_come_from_catalog() {
    let dir = TempDir::new().unwrap();
    let path = seed_in(&dir).await;
    let store = SqliteStore::open(&StoreConfig::with_path(path)).await.unwrap();

    let raw = store
        .fetch_raw("SELECT DISTINCT product, region FROM sales", 100)
        .await
        .unwrap();
    for row in &raw.rows {
        let (RawValue::Text(product), RawValue::Text(region)) = (&row[0], &row[1]) else {
            panic!("unexpected row {row:?}");
        };
        assert!(PRODUCTS.contains(&product.as_str()));
        assert!(REGIONS.contains(&region.as_str()));
    }
}
