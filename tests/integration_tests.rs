//! Integration tests for Data Insights.
//!
//! Each test seeds its own SQLite file in a temporary directory, so no
//! external services are required.
//!
//! Run with: `cargo test --test integration_tests`

mod integration;
