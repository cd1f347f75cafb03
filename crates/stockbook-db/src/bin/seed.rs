//! # Seed Data Generator
//!
//! Populates the database with demo products and a few days of sales for
//! development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 products (default)
//! cargo run -p stockbook-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockbook-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p stockbook-db --bin seed -- --db ./data/stockbook.db
//! ```
//!
//! Every product gets a deterministic pseudo-random price ($0.99-$19.99)
//! and stock level (5-105), and the most recent three days get a spread of
//! sales recorded through the reconciliation engine so merged rows and
//! trends show up in reports immediately.

use chrono::{Duration, Utc};
use std::env;
use stockbook_core::{ProductDraft, SaleRequest};
use stockbook_db::{Database, DbConfig, ReconcileError};
use tracing_subscriber::EnvFilter;

/// Base names for demo catalog entries.
const PRODUCT_NAMES: &[&str] = &[
    "Coffee Beans",
    "Green Tea",
    "Earl Grey",
    "Hot Chocolate",
    "Orange Juice",
    "Apple Juice",
    "Sparkling Water",
    "Still Water",
    "Whole Milk",
    "Oat Milk",
    "Croissant",
    "Bagel",
    "Sourdough Loaf",
    "Blueberry Muffin",
    "Granola Bar",
    "Dark Chocolate",
    "Trail Mix",
    "Peanut Butter",
    "Strawberry Jam",
    "Honey",
    "Spaghetti",
    "Penne",
    "Basmati Rice",
    "Rolled Oats",
    "Canned Tomatoes",
];

/// Size variants, with a price addon in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 100),
    ("Large", 250),
    ("Family Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./stockbook_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockbook_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockbook Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products through the catalog so every row passes the same
    // rules as production input.
    println!();
    println!("Generating products...");

    let catalog = db.catalog();
    let mut product_ids = Vec::new();
    let mut seed = 0usize;

    'outer: for name in PRODUCT_NAMES {
        for (size, addon) in SIZES {
            if product_ids.len() >= count {
                break 'outer;
            }

            let draft = ProductDraft {
                name: format!("{} {}", name, size),
                price_cents: 99 + ((seed * 37) % 1900) as i64 + addon,
                quantity_on_hand: 5 + ((seed * 13) % 101) as i64,
            };
            let product = catalog.create_product(&draft).await?;
            product_ids.push(product.id);
            seed += 1;
        }
    }

    println!("✓ Generated {} products", product_ids.len());

    // Record sales through the engine across the last three days so the
    // ledger has merged rows and a visible trend.
    println!();
    println!("Recording sales...");

    let engine = db.reconciliation();
    let today = Utc::now().date_naive();
    let mut recorded = 0usize;

    for (idx, id) in product_ids.iter().enumerate() {
        for day in 0..3i64 {
            let request = SaleRequest {
                product_id: Some(id.clone()),
                product_name: None,
                quantity: Some(1 + ((idx + day as usize) % 3) as i64),
                sale_date: Some(today - Duration::days(day)),
            };
            match engine.submit(&request).await {
                Ok(_) => recorded += 1,
                Err(ReconcileError::InsufficientStock { .. }) => {}
                Err(e) => eprintln!("Failed to record sale for {}: {}", id, e),
            }
        }
    }

    println!("✓ Recorded {} sales", recorded);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
