//! # Domain Types
//!
//! Core domain types for the Stockbook ledger.
//!
//! ## Type Overview
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  ┌────────────────────┐        ┌────────────────────┐         │
//! │  │      Product       │        │        Sale        │         │
//! │  │  ────────────────  │        │  ────────────────  │         │
//! │  │  id (UUID)         │◄───────│  product_id (opt)  │         │
//! │  │  name              │  weak  │  quantity          │         │
//! │  │  price_cents       │        │  sale_date         │         │
//! │  │  quantity_on_hand  │        │  total_cents       │         │
//! │  │  is_active         │        └────────────────────┘         │
//! │  └────────────────────┘                                       │
//! │                                                               │
//! │  The sale→product relation is non-owning: a purged product    │
//! │  leaves its sales behind with product_id = None ("decoupled").│
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity carries a UUID v4 string id, assigned on creation and
//! immutable afterwards. Product names are display labels, not keys.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name. Non-empty, not guaranteed unique.
    pub name: String,

    /// Unit price in cents. Always positive.
    pub price_cents: i64,

    /// Units currently in stock. Never negative.
    pub quantity_on_hand: i64,

    /// Whether the product can be sold. Inactive products are retained
    /// for historical sales but are not selectable for new ones.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the shelf holds at least `quantity` units.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.quantity_on_hand >= quantity
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale: one row per product per calendar date.
///
/// Same-day sales for the same product are merged by summing quantity and
/// recomputing the total at the current unit price, so the ledger never
/// holds two rows for one (product, date) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Referenced product. None once the product has been purged from
    /// the catalog (a decoupled, historical sale).
    pub product_id: Option<String>,

    /// Units sold. Always positive.
    pub quantity: i64,

    /// Calendar date of the sale (no time component).
    #[ts(as = "String")]
    pub sale_date: NaiveDate,

    /// Total amount in cents: quantity × unit price at recording time.
    pub total_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True when the referenced product has been purged.
    #[inline]
    pub fn is_decoupled(&self) -> bool {
        self.product_id.is_none()
    }
}

// =============================================================================
// Product Addressing
// =============================================================================

/// How a sale request addresses its product.
///
/// The system has carried both addressing modes through its evolution:
/// older clients send a product id, the storefront quick-entry sends a
/// name. One lookup function dispatches on the variant; the id is the
/// canonical merge key since names are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum ProductRef {
    /// Address by UUID.
    ById(String),
    /// Address by display name (matched case-insensitively).
    ByName(String),
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductRef::ById(id) => write!(f, "id {}", id),
            ProductRef::ByName(name) => write!(f, "name '{}'", name),
        }
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// A sale intent as submitted by the client.
///
/// Every field is optional on the wire so that missing data surfaces as a
/// validation error with a field name, not as a deserialization failure.
/// See [`crate::validation::validate_sale_request`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    /// Product UUID. Takes precedence over `product_name` when both are set.
    pub product_id: Option<String>,

    /// Product display name, as an alternative addressing mode.
    pub product_name: Option<String>,

    /// Units to sell. Must be positive.
    pub quantity: Option<i64>,

    /// Calendar date of the sale.
    #[ts(as = "Option<String>")]
    pub sale_date: Option<NaiveDate>,
}

/// A sale request that has passed precondition checks.
///
/// Produced only by validation; the reconciliation engine works from this
/// shape so the typed fields carry the invariants with them.
#[derive(Debug, Clone)]
pub struct ValidatedSale {
    pub product: ProductRef,
    pub quantity: i64,
    pub sale_date: NaiveDate,
}

// =============================================================================
// Catalog Drafts & Patches
// =============================================================================

/// Payload for creating a new product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub price_cents: i64,
    pub quantity_on_hand: i64,
}

/// Partial update for an existing product.
///
/// Each field is applied only when present and valid; anything else
/// leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub quantity_on_hand: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_stock_check() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Notebook".to_string(),
            price_cents: 500,
            quantity_on_hand: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(product.has_stock(10));
        assert!(product.has_stock(4));
        assert!(!product.has_stock(11));
        assert_eq!(product.price().cents(), 500);
    }

    #[test]
    fn sale_request_deserializes_from_client_json() {
        let json = r#"{"productId":"p1","quantity":4,"saleDate":"2024-01-01"}"#;
        let request: SaleRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.product_id.as_deref(), Some("p1"));
        assert_eq!(request.quantity, Some(4));
        assert_eq!(
            request.sale_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert!(request.product_name.is_none());
    }

    #[test]
    fn sale_request_tolerates_missing_fields() {
        let request: SaleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.product_id.is_none());
        assert!(request.quantity.is_none());
        assert!(request.sale_date.is_none());
    }

    #[test]
    fn product_ref_display() {
        assert_eq!(ProductRef::ById("abc".into()).to_string(), "id abc");
        assert_eq!(
            ProductRef::ByName("Coffee".into()).to_string(),
            "name 'Coffee'"
        );
    }

    #[test]
    fn decoupled_sale() {
        let now = Utc::now();
        let sale = Sale {
            id: "s1".to_string(),
            product_id: None,
            quantity: 2,
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_cents: 1000,
            created_at: now,
            updated_at: now,
        };

        assert!(sale.is_decoupled());
        assert_eq!(sale.total().cents(), 1000);
    }
}
