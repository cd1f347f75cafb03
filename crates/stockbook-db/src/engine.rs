//! # Stock Reconciliation Engine
//!
//! The one path through which sales enter the system: validate the
//! request, resolve the product, decrement stock, compute the total at
//! the current unit price, and create or merge the same-day sale record.
//! All of it happens in a single transaction.
//!
//! ## The Transaction
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  submit(request)                                                 │
//! │                                                                  │
//! │  validate (no store access) ──InvalidRequest──►                  │
//! │       │                                                          │
//! │  BEGIN                                                           │
//! │  1. touch product row        ← takes the write lock up front,    │
//! │       │                        serializing concurrent sales      │
//! │  2. read product             ← sees the latest committed stock   │
//! │       │                                                          │
//! │  3. stock check ──InsufficientStock──► ROLLBACK (no writes)      │
//! │       │                                                          │
//! │  4. guarded decrement        ← WHERE quantity_on_hand >= n       │
//! │  5. find sale (product,date)                                     │
//! │       ├── found:  quantity += n, total = quantity × price        │
//! │       └── absent: insert new row                                 │
//! │  COMMIT                                                          │
//! │                                                                  │
//! │  Exactly one product update and one sale insert-or-update per    │
//! │  successful call; zero writes on any failure path.               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 1 matters: without it, two transactions could both read the same
//! pre-decrement quantity under WAL snapshot isolation and one of them
//! would die with a busy error at the write. Taking the write lock
//! before reading turns "check then decrement" into a serialized
//! read-modify-write. The guarded decrement in step 4 keeps the
//! no-negative-stock invariant even if the locking discipline changes.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::sale::generate_sale_id;
use stockbook_core::validation::validate_sale_request;
use stockbook_core::{Product, ProductRef, Sale, SaleRequest, ValidationError};

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, quantity_on_hand, is_active, created_at, updated_at";
const SALE_COLUMNS: &str =
    "id, product_id, quantity, sale_date, total_cents, created_at, updated_at";

// =============================================================================
// Errors
// =============================================================================

/// Outcomes of a sale submission, one variant per remediation path.
///
/// `InvalidRequest` means fix the input, `InsufficientStock` means
/// restock, `Storage` is the retryable kind (lock contention, constraint
/// race). The engine never retries on its own; that is the caller's call.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The request is malformed or missing required fields.
    #[error("invalid sale request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// No active product matches the given reference.
    #[error("product not found: {0}")]
    NotFound(String),

    /// The shelf holds fewer units than requested.
    #[error("insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The underlying store failed; the request may be retried.
    #[error("storage failure: {0}")]
    Storage(#[from] DbError),
}

/// Result type for engine operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

// =============================================================================
// Engine
// =============================================================================

/// The sale reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    pool: SqlitePool,
}

impl ReconciliationEngine {
    /// Creates a new engine over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        ReconciliationEngine { pool }
    }

    /// Submits a sale request and returns the persisted (or merged) sale.
    ///
    /// Preconditions are checked in a fixed order before any store
    /// access: product identifier, then quantity, then date. The rest of
    /// the operation is all-or-nothing inside one transaction.
    pub async fn submit(&self, request: &SaleRequest) -> ReconcileResult<Sale> {
        let validated = validate_sale_request(request)?;

        debug!(
            product = %validated.product,
            quantity = validated.quantity,
            date = %validated.sale_date,
            "Submitting sale"
        );

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Take the write lock before reading so the stock check below
        // always sees the latest committed quantity.
        let touched = touch_product(&mut tx, &validated.product).await?;
        if touched == 0 {
            return Err(ReconcileError::NotFound(validated.product.to_string()));
        }

        let product = fetch_product(&mut tx, &validated.product)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(validated.product.to_string()))?;

        if !product.has_stock(validated.quantity) {
            // Dropping the transaction rolls it back; the touch above is
            // discarded along with it.
            return Err(ReconcileError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity_on_hand,
                requested: validated.quantity,
            });
        }

        let now = Utc::now();

        let decremented = sqlx::query(
            "UPDATE products \
             SET quantity_on_hand = quantity_on_hand - ?1, updated_at = ?2 \
             WHERE id = ?3 AND quantity_on_hand >= ?1",
        )
        .bind(validated.quantity)
        .bind(now)
        .bind(&product.id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if decremented.rows_affected() == 0 {
            return Err(ReconcileError::InsufficientStock {
                name: product.name.clone(),
                available: product.quantity_on_hand,
                requested: validated.quantity,
            });
        }

        // Total is always derived from the current unit price, never from
        // a price carried in the request or stored on an earlier sale.
        let existing = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE product_id = ?1 AND sale_date = ?2"
        ))
        .bind(&product.id)
        .bind(validated.sale_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let sale = match existing {
            Some(mut sale) => {
                sale.quantity += validated.quantity;
                sale.total_cents = product.price().multiply_quantity(sale.quantity).cents();
                sale.updated_at = now;

                sqlx::query(
                    "UPDATE sales SET quantity = ?2, total_cents = ?3, updated_at = ?4 \
                     WHERE id = ?1",
                )
                .bind(&sale.id)
                .bind(sale.quantity)
                .bind(sale.total_cents)
                .bind(sale.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;

                sale
            }
            None => {
                let sale = Sale {
                    id: generate_sale_id(),
                    product_id: Some(product.id.clone()),
                    quantity: validated.quantity,
                    sale_date: validated.sale_date,
                    total_cents: product
                        .price()
                        .multiply_quantity(validated.quantity)
                        .cents(),
                    created_at: now,
                    updated_at: now,
                };

                sqlx::query(
                    "INSERT INTO sales \
                     (id, product_id, quantity, sale_date, total_cents, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .bind(&sale.id)
                .bind(&sale.product_id)
                .bind(sale.quantity)
                .bind(sale.sale_date)
                .bind(sale.total_cents)
                .bind(sale.created_at)
                .bind(sale.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;

                sale
            }
        };

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            product_id = %product.id,
            quantity = sale.quantity,
            total_cents = sale.total_cents,
            "Sale reconciled"
        );

        Ok(sale)
    }
}

/// Touches the addressed product row to acquire the write lock.
/// Returns the number of matching active rows (0 = not found/inactive).
async fn touch_product(
    tx: &mut Transaction<'_, Sqlite>,
    product: &ProductRef,
) -> Result<u64, DbError> {
    let result = match product {
        ProductRef::ById(id) => {
            sqlx::query(
                "UPDATE products SET updated_at = updated_at WHERE id = ?1 AND is_active = 1",
            )
            .bind(id)
            .execute(&mut **tx)
            .await?
        }
        ProductRef::ByName(name) => {
            sqlx::query(
                "UPDATE products SET updated_at = updated_at \
                 WHERE name = ?1 COLLATE NOCASE AND is_active = 1",
            )
            .bind(name)
            .execute(&mut **tx)
            .await?
        }
    };

    Ok(result.rows_affected())
}

/// Resolves a product reference to an active product inside the
/// transaction. One function, dispatching on the addressing mode.
async fn fetch_product(
    tx: &mut Transaction<'_, Sqlite>,
    product: &ProductRef,
) -> Result<Option<Product>, DbError> {
    let product = match product {
        ProductRef::ById(id) => {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
            ))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
        }
        ProductRef::ByName(name) => {
            sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE name = ?1 COLLATE NOCASE AND is_active = 1 \
                 ORDER BY created_at LIMIT 1"
            ))
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?
        }
    };

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::NaiveDate;
    use stockbook_core::Product;
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            price_cents,
            quantity_on_hand: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(product_id: &str, quantity: i64, sale_date: NaiveDate) -> SaleRequest {
        SaleRequest {
            product_id: Some(product_id.to_string()),
            product_name: None,
            quantity: Some(quantity),
            sale_date: Some(sale_date),
        }
    }

    #[tokio::test]
    async fn new_sale_decrements_stock_and_computes_total() {
        // Product has quantity 10, price $5.00; sell 4 on 2024-01-01.
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        let engine = db.reconciliation();

        let sale = engine
            .submit(&request(&product.id, 4, date(2024, 1, 1)))
            .await
            .unwrap();

        assert_eq!(sale.quantity, 4);
        assert_eq!(sale.total_cents, 2000);
        assert_eq!(sale.product_id.as_deref(), Some(product.id.as_str()));

        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 6);
    }

    #[tokio::test]
    async fn same_day_sale_merges_into_existing_row() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        let engine = db.reconciliation();

        let first = engine
            .submit(&request(&product.id, 4, date(2024, 1, 1)))
            .await
            .unwrap();
        let merged = engine
            .submit(&request(&product.id, 3, date(2024, 1, 1)))
            .await
            .unwrap();

        // Same row, summed quantity, total recomputed from the sum.
        assert_eq!(merged.id, first.id);
        assert_eq!(merged.quantity, 7);
        assert_eq!(merged.total_cents, 3500);

        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 3);

        let all = db.sales().list_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn different_dates_create_separate_rows() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        let engine = db.reconciliation();

        engine
            .submit(&request(&product.id, 2, date(2024, 1, 1)))
            .await
            .unwrap();
        engine
            .submit(&request(&product.id, 2, date(2024, 1, 2)))
            .await
            .unwrap();

        assert_eq!(db.sales().list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_everything_unchanged() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 3).await;
        let engine = db.reconciliation();

        let err = engine
            .submit(&request(&product.id, 10, date(2024, 1, 2)))
            .await
            .unwrap_err();

        match err {
            ReconcileError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 10);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 3);
        assert!(db.sales().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exact_stock_sells_out_to_zero() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 5).await;
        let engine = db.reconciliation();

        engine
            .submit(&request(&product.id, 5, date(2024, 1, 1)))
            .await
            .unwrap();

        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 0);

        // The next unit is one too many.
        let err = engine
            .submit(&request(&product.id, 1, date(2024, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_store_access() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        let engine = db.reconciliation();

        let mut missing_date = request(&product.id, 4, date(2024, 1, 1));
        missing_date.sale_date = None;

        let err = engine.submit(&missing_date).await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRequest(_)));

        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 10);
        assert!(db.sales().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let db = test_db().await;
        let engine = db.reconciliation();

        let err = engine
            .submit(&request(&generate_product_id(), 1, date(2024, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
    }

    #[tokio::test]
    async fn inactive_product_is_not_found() {
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        db.products().soft_delete(&product.id).await.unwrap();
        let engine = db.reconciliation();

        let err = engine
            .submit(&request(&product.id, 1, date(2024, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
    }

    #[tokio::test]
    async fn addressing_by_name_resolves_case_insensitively() {
        let db = test_db().await;
        let product = seeded_product(&db, "Green Tea", 300, 10).await;
        let engine = db.reconciliation();

        let by_name = SaleRequest {
            product_id: None,
            product_name: Some("green tea".to_string()),
            quantity: Some(2),
            sale_date: Some(date(2024, 1, 1)),
        };

        let sale = engine.submit(&by_name).await.unwrap();
        assert_eq!(sale.product_id.as_deref(), Some(product.id.as_str()));
        assert_eq!(sale.total_cents, 600);
    }

    #[tokio::test]
    async fn id_and_name_modes_merge_into_one_row() {
        // Merge is keyed by resolved product id, so the addressing mode
        // of each request is irrelevant.
        let db = test_db().await;
        let product = seeded_product(&db, "Coffee", 500, 10).await;
        let engine = db.reconciliation();

        engine
            .submit(&request(&product.id, 2, date(2024, 1, 1)))
            .await
            .unwrap();

        let by_name = SaleRequest {
            product_id: None,
            product_name: Some("coffee".to_string()),
            quantity: Some(3),
            sale_date: Some(date(2024, 1, 1)),
        };
        let merged = engine.submit(&by_name).await.unwrap();

        assert_eq!(merged.quantity, 5);
        assert_eq!(db.sales().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn merge_total_uses_current_price_not_historical_sum() {
        let db = test_db().await;
        let mut product = seeded_product(&db, "Coffee", 500, 20).await;
        let engine = db.reconciliation();

        engine
            .submit(&request(&product.id, 4, date(2024, 1, 1)))
            .await
            .unwrap();

        // Price rises to $6.00 between the two sales.
        product.price_cents = 600;
        product.quantity_on_hand = 16;
        db.products().update(&product).await.unwrap();

        let merged = engine
            .submit(&request(&product.id, 3, date(2024, 1, 1)))
            .await
            .unwrap();

        // 7 × $6.00, not $20.00 + 3 × $6.00.
        assert_eq!(merged.quantity, 7);
        assert_eq!(merged.total_cents, 4200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sales_never_lose_an_update() {
        // In-memory SQLite is single-connection, so concurrency needs a
        // file-backed database.
        let path = std::env::temp_dir().join(format!("stockbook-engine-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let product = seeded_product(&db, "Coffee", 500, 100).await;

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = db.reconciliation();
            let id = product.id.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    // Storage failures are the retryable kind; retrying is
                    // the caller's job, which this loop plays here.
                    loop {
                        match engine.submit(&request(&id, 2, date(2024, 1, 1))).await {
                            Ok(_) => break,
                            Err(ReconcileError::Storage(_)) => continue,
                            Err(other) => panic!("unexpected error: {other:?}"),
                        }
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 4 tasks × 5 sales × 2 units = 40 units sold, one merged row.
        let shelf = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(shelf.quantity_on_hand, 60);

        let sales = db.sales().list_all().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 40);
        assert_eq!(sales[0].total_cents, 40 * 500);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
