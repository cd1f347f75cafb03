//! # Repository Module
//!
//! Database repository implementations for Stockbook.
//!
//! ## Repository Pattern
//! ```text
//! caller                                   SQLite
//!   │  db.products().get_active_by_id(id)    │
//!   ▼                                        │
//! ProductRepository ── SQL ──────────────────►
//! SaleRepository    ── SQL ──────────────────►
//! ```
//!
//! Repositories own the SQL and nothing else: business rules live in
//! stockbook-core, and multi-statement transactions (the reconciliation
//! engine, catalog removal) run their own statements so every read and
//! write shares one transaction.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - catalog rows
//! - [`sale::SaleRepository`] - ledger rows, paging, decoupling

pub mod product;
pub mod sale;
