//! # Product Catalog Service
//!
//! Lifecycle operations for catalog products: create, patch, remove,
//! purge.
//!
//! ## Removal vs. Purge
//! ```text
//! remove_product(id)                     purge_product(id)
//!   │                                      │
//!   ├─ sale history?  ── yes ─► soft       ├─ sales.product_id = NULL
//!   │                   (is_active = 0)    │   (decoupled, kept in ledger)
//!   └─ no ─► hard delete                   └─ DELETE product row
//! ```
//!
//! `remove_product` is the everyday path: it keeps the ledger intact by
//! retiring products that have been sold. `purge_product` erases the
//! product unconditionally but leaves its sales behind as decoupled
//! history, so report unit counts survive the purge.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::error::DbError;
use crate::repository::product::{generate_product_id, ProductRepository};
use crate::repository::sale::SaleRepository;
use stockbook_core::validation::{
    validate_price_cents, validate_product_draft, validate_product_name, validate_stock_level,
};
use stockbook_core::{Product, ProductDraft, ProductPatch, ValidationError};

// =============================================================================
// Errors
// =============================================================================

/// Failures of catalog lifecycle operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The payload fails a precondition check.
    #[error("invalid product data: {0}")]
    Invalid(#[from] ValidationError),

    /// No product with the given id exists.
    #[error("product not found: id {0}")]
    NotFound(String),

    /// The underlying store failed.
    #[error("storage failure: {0}")]
    Storage(#[from] DbError),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// How a product was removed from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRemoval {
    /// Retired (is_active = 0); it had sale history worth keeping.
    SoftDeleted,
    /// Row deleted; nothing referenced it.
    Deleted,
}

// =============================================================================
// Service
// =============================================================================

/// Product lifecycle service.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    /// Creates a new catalog service over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Creates a new product from a draft.
    pub async fn create_product(&self, draft: &ProductDraft) -> CatalogResult<Product> {
        validate_product_draft(draft)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: draft.name.trim().to_string(),
            price_cents: draft.price_cents,
            quantity_on_hand: draft.quantity_on_hand,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, "Product created");

        Ok(product)
    }

    /// Applies a partial update to a product.
    ///
    /// Each patch field is applied only when present and valid; a present
    /// but invalid value (blank name, non-positive price, negative stock)
    /// is skipped and the stored value stays. A fully empty patch is a
    /// no-op that still returns the current product.
    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> CatalogResult<Product> {
        let repo = self.products();
        let mut product = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        if let Some(name) = patch.name.as_deref() {
            if validate_product_name(name).is_ok() {
                product.name = name.trim().to_string();
            }
        }
        if let Some(price_cents) = patch.price_cents {
            if validate_price_cents(price_cents).is_ok() {
                product.price_cents = price_cents;
            }
        }
        if let Some(quantity) = patch.quantity_on_hand {
            if validate_stock_level(quantity).is_ok() {
                product.quantity_on_hand = quantity;
            }
        }

        repo.update(&product).await?;

        info!(id = %product.id, "Product updated");

        Ok(product)
    }

    /// Removes a product from the catalog.
    ///
    /// Products with sale history are retired (soft delete) so the ledger
    /// keeps resolving them; products never sold are deleted outright.
    pub async fn remove_product(&self, id: &str) -> CatalogResult<ProductRemoval> {
        let repo = self.products();
        if repo.get_by_id(id).await?.is_none() {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        let removal = if self.sales().count_for_product(id).await? > 0 {
            repo.soft_delete(id).await?;
            ProductRemoval::SoftDeleted
        } else {
            repo.hard_delete(id).await?;
            ProductRemoval::Deleted
        };

        info!(id = %id, ?removal, "Product removed");

        Ok(removal)
    }

    /// Erases a product unconditionally, decoupling its sales first.
    ///
    /// Both steps run in one transaction; returns the number of sales
    /// decoupled. The sales stay in the ledger with `product_id = None`.
    pub async fn purge_product(&self, id: &str) -> CatalogResult<u64> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let decoupled = sqlx::query(
            "UPDATE sales SET product_id = NULL, updated_at = ?2 WHERE product_id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, decoupled_sales = decoupled, "Product purged");

        Ok(decoupled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use stockbook_core::SaleRequest;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn draft(name: &str, price_cents: i64, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price_cents,
            quantity_on_hand: stock,
        }
    }

    async fn record_sale(db: &Database, product_id: &str, quantity: i64) {
        let request = SaleRequest {
            product_id: Some(product_id.to_string()),
            product_name: None,
            quantity: Some(quantity),
            sale_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        db.reconciliation().submit(&request).await.unwrap();
    }

    #[tokio::test]
    async fn create_product_trims_name() {
        let db = test_db().await;
        let catalog = db.catalog();

        let product = catalog
            .create_product(&draft("  Coffee  ", 500, 10))
            .await
            .unwrap();
        assert_eq!(product.name, "Coffee");
        assert!(product.is_active);

        let stored = db.products().get_by_id(&product.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn create_rejects_free_items() {
        let db = test_db().await;
        let err = db
            .catalog()
            .create_product(&draft("Coffee", 0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[tokio::test]
    async fn patch_applies_only_present_fields() {
        let db = test_db().await;
        let catalog = db.catalog();
        let product = catalog.create_product(&draft("Coffee", 500, 10)).await.unwrap();

        let patch = ProductPatch {
            price_cents: Some(600),
            ..Default::default()
        };
        let updated = catalog.update_product(&product.id, &patch).await.unwrap();

        assert_eq!(updated.price_cents, 600);
        assert_eq!(updated.name, "Coffee");
        assert_eq!(updated.quantity_on_hand, 10);
    }

    #[tokio::test]
    async fn patch_skips_invalid_values() {
        let db = test_db().await;
        let catalog = db.catalog();
        let product = catalog.create_product(&draft("Coffee", 500, 10)).await.unwrap();

        let patch = ProductPatch {
            name: Some("   ".to_string()),
            price_cents: Some(-5),
            quantity_on_hand: Some(25),
        };
        let updated = catalog.update_product(&product.id, &patch).await.unwrap();

        // The two invalid fields are ignored, the valid one lands.
        assert_eq!(updated.name, "Coffee");
        assert_eq!(updated.price_cents, 500);
        assert_eq!(updated.quantity_on_hand, 25);
    }

    #[tokio::test]
    async fn patch_missing_product_is_not_found() {
        let db = test_db().await;
        let err = db
            .catalog()
            .update_product("no-such-id", &ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_unsold_product_deletes_the_row() {
        let db = test_db().await;
        let catalog = db.catalog();
        let product = catalog.create_product(&draft("Coffee", 500, 10)).await.unwrap();

        let removal = catalog.remove_product(&product.id).await.unwrap();
        assert_eq!(removal, ProductRemoval::Deleted);
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_sold_product_soft_deletes() {
        let db = test_db().await;
        let catalog = db.catalog();
        let product = catalog.create_product(&draft("Coffee", 500, 10)).await.unwrap();
        record_sale(&db, &product.id, 2).await;

        let removal = catalog.remove_product(&product.id).await.unwrap();
        assert_eq!(removal, ProductRemoval::SoftDeleted);

        // Row stays, flagged inactive; the sale still points at it.
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        let sales = db.sales().list_all().await.unwrap();
        assert_eq!(sales[0].product_id.as_deref(), Some(product.id.as_str()));
    }

    #[tokio::test]
    async fn purge_decouples_sales_and_deletes() {
        let db = test_db().await;
        let catalog = db.catalog();
        let product = catalog.create_product(&draft("Coffee", 500, 10)).await.unwrap();
        record_sale(&db, &product.id, 2).await;

        let decoupled = catalog.purge_product(&product.id).await.unwrap();
        assert_eq!(decoupled, 1);

        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
        let sales = db.sales().list_all().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert!(sales[0].is_decoupled());
        // The recorded total survives the purge.
        assert_eq!(sales[0].total_cents, 1000);
    }

    #[tokio::test]
    async fn purge_missing_product_is_not_found() {
        let db = test_db().await;
        let err = db.catalog().purge_product("no-such-id").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
