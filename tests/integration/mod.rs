//! End-to-end tests against a seeded temporary store.

pub mod agent_test;
pub mod gate_test;
pub mod seed_test;
pub mod store_test;

use data_insights::config::StoreConfig;
use data_insights::db::{create_sample_database, SeedOptions, SqliteStore};
use std::path::PathBuf;
use tempfile::TempDir;

/// Seeds the default sample dataset in `dir` and returns its path.
pub async fn seed_in(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("sales_data.db");
    create_sample_database(&SeedOptions::new(&path))
        .await
        .unwrap();
    path
}

/// Seeds the sample dataset and opens the read-only store over it.
pub async fn seeded_store(dir: &TempDir) -> SqliteStore {
    let path = seed_in(dir).await;
    SqliteStore::open(&StoreConfig::with_path(path)).await.unwrap()
}
