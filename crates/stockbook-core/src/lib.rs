//! # stockbook-core: Pure Business Logic for Stockbook
//!
//! Stockbook tracks a product catalog and the sales made against it. This
//! crate holds everything that can be expressed without I/O: the domain
//! types, money arithmetic, request validation, and the report fold.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Storefront / Admin Client                      │
//! └───────────────────────────────┬─────────────────────────────────┘
//! ┌───────────────────────────────▼─────────────────────────────────┐
//! │             ★ stockbook-core (THIS CRATE) ★                     │
//! │                                                                 │
//! │   ┌──────────┐  ┌──────────┐  ┌────────────┐  ┌──────────┐      │
//! │   │  types   │  │  money   │  │ validation │  │  report  │      │
//! │   │ Product  │  │  Money   │  │  ordered   │  │ summary, │      │
//! │   │  Sale    │  │ (cents)  │  │  checks    │  │   CSV    │      │
//! │   └──────────┘  └──────────┘  └────────────┘  └──────────┘      │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │
//! └───────────────────────────────┬─────────────────────────────────┘
//! ┌───────────────────────────────▼─────────────────────────────────┐
//! │              stockbook-db (SQLite, reconciliation)              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **Integer Money**: all monetary values are cents (i64), never floats
//! 3. **Explicit Errors**: typed errors, never strings or panics

pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use money::Money;
pub use report::{ProductSales, SalesSummary, TrendPoint};
pub use types::*;

/// Maximum quantity accepted in a single sale request.
///
/// Guards against fat-finger entries (1000 instead of 10) before they
/// reach the stock check. Can be made configurable later if a store
/// genuinely moves more than this in one transaction.
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Maximum length of a product name.
pub const MAX_NAME_LENGTH: usize = 200;
