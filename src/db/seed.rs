//! Sample store creation.
//!
//! Builds the `sales` and `customers` tables over its own writable
//! connection. The read-only store never sees this path.

use crate::error::{InsightsError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Products sold in the sample dataset.
pub const PRODUCTS: [&str; 24] = [
    "Laptop Pro",
    "Wireless Mouse",
    "Mechanical Keyboard",
    "USB-C Hub",
    "Monitor 27in",
    "Webcam HD",
    "Headphones",
    "Desk Lamp",
    "Standing Desk",
    "Ergonomic Chair",
    "Tablet",
    "Smartphone",
    "Smartwatch",
    "Bluetooth Speaker",
    "Power Bank",
    "Cable Set",
    "Screen Protector",
    "Laptop Bag",
    "USB Drive",
    "External SSD",
    "Gaming Mouse",
    "RGB Keyboard",
    "Microphone",
    "Streaming Camera",
];

/// Customers in the sample dataset.
pub const CUSTOMERS: [&str; 20] = [
    "Acme Corp",
    "Tech Solutions Inc",
    "Global Industries",
    "Digital Ventures",
    "Innovation Labs",
    "Future Systems",
    "Cloud Services",
    "Data Analytics Co",
    "Software Solutions",
    "Hardware Plus",
    "Network Systems",
    "Security Pro",
    "Enterprise Solutions",
    "Startup Hub",
    "Dev Tools Inc",
    "AI Research Lab",
    "Blockchain Co",
    "Mobile Apps Ltd",
    "Web Services",
    "IT Consulting",
];

/// Sales regions.
pub const REGIONS: [&str; 6] = [
    "North America",
    "Europe",
    "Asia Pacific",
    "South America",
    "Middle East",
    "Africa",
];

const CATEGORIES: [&str; 5] = [
    "Electronics",
    "Accessories",
    "Furniture",
    "Software",
    "Services",
];

const SCHEMA_SQL: [&str; 2] = [
    r#"
    CREATE TABLE sales (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        customer TEXT NOT NULL,
        product TEXT NOT NULL,
        category TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price REAL NOT NULL,
        total_amount REAL NOT NULL,
        region TEXT NOT NULL,
        sales_rep TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        region TEXT NOT NULL,
        contact_email TEXT,
        total_orders INTEGER DEFAULT 0,
        total_spent REAL DEFAULT 0.0
    )
    "#,
];

/// Options for creating the sample store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    /// Where to create the SQLite file.
    pub path: PathBuf,

    /// Number of sales rows to generate.
    pub sales_rows: usize,

    /// Generator seed; the same seed yields the same dataset.
    pub seed: u64,

    /// Replace an existing file instead of refusing.
    pub force: bool,
}

impl SeedOptions {
    /// Default options for the given path: 600 rows, fixed seed, no overwrite.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sales_rows: 600,
            seed: 42,
            force: false,
        }
    }
}

/// What a seeding run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub path: PathBuf,
    pub sales_rows: usize,
    pub customers: usize,
}

/// Creates the sample store described by `options`.
pub async fn create_sample_database(options: &SeedOptions) -> Result<SeedSummary> {
    prepare_target(&options.path, options.force)?;

    let mut conn = SqliteConnectOptions::new()
        .filename(&options.path)
        .create_if_missing(true)
        .connect()
        .await
        .map_err(|e| {
            InsightsError::seed(format!(
                "Failed to create store at {}: {e}",
                options.path.display()
            ))
        })?;

    populate(&mut conn, options).await?;

    conn.close()
        .await
        .map_err(|e| InsightsError::seed(format!("Failed to close seeded store: {e}")))?;

    info!(
        path = %options.path.display(),
        sales_rows = options.sales_rows,
        customers = CUSTOMERS.len(),
        "Sample store created"
    );

    Ok(SeedSummary {
        path: options.path.clone(),
        sales_rows: options.sales_rows,
        customers: CUSTOMERS.len(),
    })
}

/// Creates parent directories and clears an existing file when forced.
fn prepare_target(path: &Path, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            return Err(InsightsError::seed(format!(
                "{} already exists. Use --force to recreate it.",
                path.display()
            )));
        }
        warn!(path = %path.display(), "Replacing existing store");
        std::fs::remove_file(path).map_err(|e| {
            InsightsError::seed(format!("Failed to remove {}: {e}", path.display()))
        })?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            InsightsError::seed(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

async fn populate(conn: &mut SqliteConnection, options: &SeedOptions) -> Result<()> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| InsightsError::seed(format!("Failed to begin transaction: {e}")))?;

    for statement in SCHEMA_SQL {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| InsightsError::seed(format!("Failed to create tables: {e}")))?;
    }

    let mut rng = StdRng::seed_from_u64(options.seed);

    for _ in 0..options.sales_rows {
        let sale = SampleSale::generate(&mut rng);
        sqlx::query(
            r#"
            INSERT INTO sales
                (date, customer, product, category, quantity, unit_price, total_amount, region, sales_rep)
            VALUES
                (date('2023-01-01', '+' || ?1 || ' days'), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(sale.day_offset)
        .bind(sale.customer)
        .bind(sale.product)
        .bind(sale.category)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.total_amount)
        .bind(sale.region)
        .bind(&sale.sales_rep)
        .execute(&mut *tx)
        .await
        .map_err(|e| InsightsError::seed(format!("Failed to insert sales row: {e}")))?;
    }

    for customer in CUSTOMERS {
        let region = pick(&mut rng, &REGIONS);
        let email = format!("{}@example.com", customer.to_lowercase().replace(' ', "_"));
        sqlx::query(
            r#"
            INSERT INTO customers (name, region, contact_email, total_orders, total_spent)
            SELECT ?1, ?2, ?3, COUNT(*), COALESCE(ROUND(SUM(total_amount), 2), 0.0)
            FROM sales WHERE customer = ?1
            "#,
        )
        .bind(customer)
        .bind(region)
        .bind(email)
        .execute(&mut *tx)
        .await
        .map_err(|e| InsightsError::seed(format!("Failed to insert customer {customer}: {e}")))?;
    }

    tx.commit()
        .await
        .map_err(|e| InsightsError::seed(format!("Failed to commit sample data: {e}")))
}

/// One generated sales row.
#[derive(Debug, Clone, PartialEq)]
struct SampleSale {
    day_offset: i64,
    customer: &'static str,
    product: &'static str,
    category: &'static str,
    quantity: i64,
    unit_price: f64,
    total_amount: f64,
    region: &'static str,
    sales_rep: String,
}

impl SampleSale {
    fn generate(rng: &mut StdRng) -> Self {
        let day_offset = rng.random_range(0..=365_i64);
        let customer = pick(rng, &CUSTOMERS);
        let product = pick(rng, &PRODUCTS);
        let category = pick(rng, &CATEGORIES);
        let quantity = rng.random_range(1..=10_i64);
        // Prices in cents keep totals exact to two decimals.
        let unit_cents = rng.random_range(1_000..=200_000_i64);
        let region = pick(rng, &REGIONS);
        let sales_rep = format!("Rep_{}", rng.random_range(1..=10));

        Self {
            day_offset,
            customer,
            product,
            category,
            quantity,
            unit_price: unit_cents as f64 / 100.0,
            total_amount: (unit_cents * quantity) as f64 / 100.0,
            region,
            sales_rep,
        }
    }
}

/// Picks one entry of a non-empty catalog.
fn pick(rng: &mut StdRng, items: &[&'static str]) -> &'static str {
    items[rng.random_range(0..items.len())]
}
