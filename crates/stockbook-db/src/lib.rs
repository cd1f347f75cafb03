//! # stockbook-db: Persistence Layer for Stockbook
//!
//! SQLite storage for the Stockbook catalog and sales ledger, plus the
//! two services that own multi-statement transactions: the reconciliation
//! engine and the catalog lifecycle.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Stockbook Data Flow                          │
//! │                                                                  │
//! │  SaleRequest (storefront)                                        │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │                  stockbook-db (THIS CRATE)                 │  │
//! │  │                                                            │  │
//! │  │  ┌───────────┐  ┌──────────────┐  ┌─────────────────────┐  │  │
//! │  │  │ Database  │  │ Repositories │  │ Services            │  │  │
//! │  │  │ (pool.rs) │  │ product.rs   │  │ engine.rs (sales)   │  │  │
//! │  │  │           │  │ sale.rs      │  │ catalog.rs (products│  │  │
//! │  │  │ SqlitePool│◄─│              │◄─│  create/remove/purge│  │  │
//! │  │  └───────────┘  └──────────────┘  └─────────────────────┘  │  │
//! │  │        │                                                   │  │
//! │  │        ▼  embedded migrations (001_initial_schema.sql)     │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! │       │                                                          │
//! │       ▼                                                          │
//! │  SQLite (WAL) — stockbook.db                                     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, sale)
//! - [`engine`] - The stock reconciliation engine
//! - [`catalog`] - Product lifecycle service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stockbook.db")).await?;
//!
//! // Record a sale (validates, decrements stock, merges same-day rows).
//! let sale = db.reconciliation().submit(&request).await?;
//!
//! // Catalog lifecycle.
//! let product = db.catalog().create_product(&draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Service re-exports
pub use catalog::{CatalogError, CatalogService, ProductRemoval};
pub use engine::{ReconcileError, ReconciliationEngine};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::{SalePage, SaleRepository};
