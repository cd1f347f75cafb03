//! # Sale Repository
//!
//! Database operations for the sale ledger.
//!
//! ## Ledger Shape
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  One row per (product, date).                                │
//! │                                                              │
//! │  2024-01-01  Coffee   qty 4   $20.00                         │
//! │  2024-01-01  Tea      qty 2   $ 6.00                         │
//! │  2024-01-02  Coffee   qty 3   $15.00                         │
//! │                                                              │
//! │  A second Coffee sale on 2024-01-01 does not add a row; the  │
//! │  reconciliation engine merges it into the existing one.      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The merge itself happens inside the engine's transaction; this
//! repository only provides the building blocks plus the read paths the
//! listing endpoints use.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::Sale;

const SALE_COLUMNS: &str =
    "id, product_id, quantity, sale_date, total_cents, created_at, updated_at";

/// Default page size when the client sends zero.
const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of sales for a listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePage {
    pub items: Vec<Sale>,
    pub page: u32,
    pub size: u32,
    pub total_count: i64,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Finds the sale for a (product, date) pair, if any.
    ///
    /// At most one exists by construction; the partial UNIQUE index
    /// guarantees it at the storage layer.
    pub async fn find_by_product_and_date(
        &self,
        product_id: &str,
        date: NaiveDate,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE product_id = ?1 AND sale_date = ?2"
        ))
        .bind(product_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Inserts a sale row.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, product_id = ?sale.product_id, "Inserting sale");

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
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rewrites a sale's quantity and total after a merge.
    pub async fn update_amounts(&self, id: &str, quantity: i64, total_cents: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET quantity = ?2, total_cents = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(quantity)
        .bind(total_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Lists all sales in ledger order (date, then insertion).
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Returns one page of sales, sorted and optionally filtered by the
    /// referenced product's name.
    ///
    /// Defensive about client input the way listing endpoints have to
    /// be: a zero size falls back to [`DEFAULT_PAGE_SIZE`], the sort
    /// column is matched against a whitelist (never interpolated from
    /// the request), and direction defaults to ascending.
    pub async fn list_page(
        &self,
        page: u32,
        size: u32,
        sort_by: &str,
        direction: &str,
        search: Option<&str>,
    ) -> DbResult<SalePage> {
        let size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };

        let column = match sort_by {
            "sale_date" | "date" => "s.sale_date",
            "quantity" => "s.quantity",
            "total_cents" | "total" => "s.total_cents",
            _ => "s.id",
        };
        let order = if direction.eq_ignore_ascii_case("desc") {
            "DESC"
        } else {
            "ASC"
        };

        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let offset = i64::from(page) * i64::from(size);

        let items = sqlx::query_as::<_, Sale>(&format!(
            "SELECT s.id, s.product_id, s.quantity, s.sale_date, s.total_cents, \
                    s.created_at, s.updated_at \
             FROM sales s \
             LEFT JOIN products p ON p.id = s.product_id \
             WHERE (?1 IS NULL OR p.name LIKE '%' || ?1 || '%') \
             ORDER BY {column} {order} \
             LIMIT ?2 OFFSET ?3"
        ))
        .bind(search)
        .bind(i64::from(size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) \
             FROM sales s \
             LEFT JOIN products p ON p.id = s.product_id \
             WHERE (?1 IS NULL OR p.name LIKE '%' || ?1 || '%')",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalePage {
            items,
            page,
            size,
            total_count,
        })
    }

    /// Clears the product reference on every sale for a removed product,
    /// keeping the rows as historical, productless records.
    pub async fn decouple_product(&self, product_id: &str) -> DbResult<u64> {
        debug!(product_id = %product_id, "Decoupling sales from product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sales SET product_id = NULL, updated_at = ?2 WHERE product_id = ?1",
        )
        .bind(product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts sales referencing a product.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}
