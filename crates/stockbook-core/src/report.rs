//! # Report Aggregation
//!
//! Pure folds over the full product and sale sets. Read-only and
//! deterministic: the same store state always yields the same summary,
//! so the dashboard can refresh as often as it likes.
//!
//! Sale values are computed at the *current* unit price (the ledger's
//! stored totals already track that price through merges); sales whose
//! product has been purged contribute zero.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, Sale};

// =============================================================================
// Summary Types
// =============================================================================

/// One point of the sales trend: total value on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Aggregate value sold for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub name: String,
    pub total_cents: i64,
}

/// The dashboard summary: headline totals plus the two breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Total value across all sales, in cents.
    pub total_sales_cents: i64,
    /// Total units sold across all sales.
    pub total_units_sold: i64,
    /// Per-date value buckets, ascending by date.
    pub trend: Vec<TrendPoint>,
    /// Per-product value, products with zero value omitted.
    pub by_product: Vec<ProductSales>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Folds the full product and sale sets into a [`SalesSummary`].
///
/// ## What Each Number Means
/// - `total_sales_cents`: Σ quantity × current unit price
/// - `total_units_sold`: Σ quantity (decoupled sales still count units)
/// - `trend`: the same value sum grouped by sale date, sorted ascending
/// - `by_product`: value per product in catalog order, nonzero only
pub fn summarize(products: &[Product], sales: &[Sale]) -> SalesSummary {
    let price_by_id: HashMap<&str, i64> = products
        .iter()
        .map(|p| (p.id.as_str(), p.price_cents))
        .collect();

    let value_of = |sale: &Sale| -> i64 {
        sale.product_id
            .as_deref()
            .and_then(|id| price_by_id.get(id))
            .map(|price| price * sale.quantity)
            .unwrap_or(0)
    };

    let total_sales_cents: i64 = sales.iter().map(value_of).sum();
    let total_units_sold: i64 = sales.iter().map(|s| s.quantity).sum();

    // BTreeMap keeps the trend sorted by date; dates are unique keys so
    // there are no ties to break.
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for sale in sales {
        *buckets.entry(sale.sale_date).or_insert(0) += value_of(sale);
    }
    let trend = buckets
        .into_iter()
        .map(|(date, total_cents)| TrendPoint { date, total_cents })
        .collect();

    let by_product = products
        .iter()
        .map(|product| {
            let total_cents: i64 = sales
                .iter()
                .filter(|s| s.product_id.as_deref() == Some(product.id.as_str()))
                .map(|s| product.price_cents * s.quantity)
                .sum();
            ProductSales {
                name: product.name.clone(),
                total_cents,
            }
        })
        .filter(|item| item.total_cents > 0)
        .collect();

    SalesSummary {
        total_sales_cents,
        total_units_sold,
        trend,
        by_product,
    }
}

// =============================================================================
// Tabular Export
// =============================================================================

/// Column headers of the sales export, in sheet order.
pub const CSV_HEADERS: [&str; 6] = [
    "SL NO",
    "PRODUCT NAME",
    "QUANTITY",
    "UNIT PRICE",
    "TOTAL",
    "DATE",
];

/// Renders all sales as CSV with one row per sale.
///
/// Decoupled sales are skipped: without a product there is no name or
/// unit price to print. Prices are plain decimals; currency formatting
/// belongs to the consumer of the file.
pub fn sales_csv(products: &[Product], sales: &[Sale]) -> String {
    let product_by_id: HashMap<&str, &Product> =
        products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push('\n');

    let mut row_number: u64 = 0;
    for sale in sales {
        let Some(product) = sale
            .product_id
            .as_deref()
            .and_then(|id| product_by_id.get(id))
        else {
            continue;
        };

        row_number += 1;
        let unit_price = Money::from_cents(product.price_cents);
        let total = unit_price.multiply_quantity(sale.quantity);

        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row_number,
            csv_quote(&product.name),
            sale.quantity,
            unit_price.to_decimal_string(),
            total.to_decimal_string(),
            sale.sale_date,
        ));
    }

    out
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
fn csv_quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            quantity_on_hand: 100,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(id: &str, product_id: Option<&str>, quantity: i64, date: (i32, u32, u32)) -> Sale {
        let now = Utc::now();
        Sale {
            id: id.to_string(),
            product_id: product_id.map(String::from),
            quantity,
            sale_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            total_cents: 0, // summary recomputes from current prices
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn headline_totals() {
        let products = vec![product("p1", "Coffee", 500), product("p2", "Tea", 300)];
        let sales = vec![
            sale("s1", Some("p1"), 4, (2024, 1, 1)),
            sale("s2", Some("p2"), 2, (2024, 1, 1)),
        ];

        let summary = summarize(&products, &sales);
        assert_eq!(summary.total_sales_cents, 4 * 500 + 2 * 300);
        assert_eq!(summary.total_units_sold, 6);
    }

    #[test]
    fn decoupled_sales_contribute_zero_value_but_count_units() {
        let products = vec![product("p1", "Coffee", 500)];
        let sales = vec![
            sale("s1", Some("p1"), 2, (2024, 1, 1)),
            sale("s2", None, 3, (2024, 1, 2)),
        ];

        let summary = summarize(&products, &sales);
        assert_eq!(summary.total_sales_cents, 1000);
        assert_eq!(summary.total_units_sold, 5);
    }

    #[test]
    fn trend_sorted_ascending_by_date() {
        let products = vec![product("p1", "Coffee", 100)];
        let sales = vec![
            sale("s1", Some("p1"), 1, (2024, 3, 1)),
            sale("s2", Some("p1"), 1, (2024, 1, 1)),
            sale("s3", Some("p1"), 1, (2024, 2, 1)),
        ];

        let summary = summarize(&products, &sales);
        let dates: Vec<NaiveDate> = summary.trend.iter().map(|t| t.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(summary.trend.len(), 3);
    }

    #[test]
    fn by_product_filters_zero_value() {
        let products = vec![
            product("p1", "Coffee", 500),
            product("p2", "Tea", 300), // never sold
        ];
        let sales = vec![sale("s1", Some("p1"), 1, (2024, 1, 1))];

        let summary = summarize(&products, &sales);
        assert_eq!(summary.by_product.len(), 1);
        assert_eq!(summary.by_product[0].name, "Coffee");
        assert_eq!(summary.by_product[0].total_cents, 500);
    }

    #[test]
    fn summary_is_idempotent() {
        let products = vec![product("p1", "Coffee", 500), product("p2", "Tea", 300)];
        let sales = vec![
            sale("s1", Some("p1"), 4, (2024, 1, 1)),
            sale("s2", Some("p2"), 2, (2024, 1, 2)),
            sale("s3", None, 1, (2024, 1, 3)),
        ];

        assert_eq!(summarize(&products, &sales), summarize(&products, &sales));
    }

    #[test]
    fn csv_rows_and_quoting() {
        let products = vec![product("p1", "Beans, Dark \"Roast\"", 1250)];
        let sales = vec![
            sale("s1", Some("p1"), 2, (2024, 1, 1)),
            sale("s2", None, 5, (2024, 1, 2)), // decoupled, skipped
        ];

        let csv = sales_csv(&products, &sales);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2); // header + one row
        assert_eq!(lines[0], "SL NO,PRODUCT NAME,QUANTITY,UNIT PRICE,TOTAL,DATE");
        assert_eq!(
            lines[1],
            "1,\"Beans, Dark \"\"Roast\"\"\",2,12.50,25.00,2024-01-01"
        );
    }
}
