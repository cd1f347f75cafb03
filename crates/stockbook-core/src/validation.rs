//! # Validation Module
//!
//! Precondition checks for incoming requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Layer 1: Client (TypeScript)                                 │
//! │  └── format checks, immediate feedback                        │
//! │           │                                                   │
//! │           ▼                                                   │
//! │  Layer 2: THIS MODULE (before any store access)               │
//! │  └── ordered precondition checks; first failure wins          │
//! │           │                                                   │
//! │           ▼                                                   │
//! │  Layer 3: SQLite                                              │
//! │  └── CHECK / UNIQUE / FK constraints as the last line         │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::{ProductDraft, ProductRef, SaleRequest, ValidatedSale};
use crate::{MAX_NAME_LENGTH, MAX_SALE_QUANTITY};

// =============================================================================
// Sale Request
// =============================================================================

/// Validates a sale request and lifts it into its typed form.
///
/// Checks run in a fixed order and the first failure is returned as-is,
/// never coerced:
/// 1. a product identifier must be present (id wins over name),
/// 2. quantity must be present and positive (and within the sanity cap),
/// 3. the sale date must be present.
///
/// ## Example
/// ```rust
/// use stockbook_core::types::SaleRequest;
/// use stockbook_core::validation::validate_sale_request;
///
/// let request = SaleRequest {
///     product_id: Some("550e8400-e29b-41d4-a716-446655440000".into()),
///     quantity: Some(4),
///     sale_date: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
///     ..Default::default()
/// };
/// let validated = validate_sale_request(&request).unwrap();
/// assert_eq!(validated.quantity, 4);
/// ```
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<ValidatedSale> {
    let product = resolve_product_ref(request)?;

    let quantity = request.quantity.ok_or_else(|| ValidationError::Required {
        field: "quantity".to_string(),
    })?;
    validate_sale_quantity(quantity)?;

    let sale_date = request.sale_date.ok_or_else(|| ValidationError::Required {
        field: "sale date".to_string(),
    })?;

    Ok(ValidatedSale {
        product,
        quantity,
        sale_date,
    })
}

/// Picks the addressing mode out of a request. Id is canonical and wins
/// when both are supplied.
fn resolve_product_ref(request: &SaleRequest) -> ValidationResult<ProductRef> {
    if let Some(id) = request.product_id.as_deref() {
        let id = id.trim();
        if !id.is_empty() {
            validate_uuid(id)?;
            return Ok(ProductRef::ById(id.to_string()));
        }
    }

    if let Some(name) = request.product_name.as_deref() {
        let name = name.trim();
        if !name.is_empty() {
            return Ok(ProductRef::ByName(name.to_string()));
        }
    }

    Err(ValidationError::Required {
        field: "product".to_string(),
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Validates a product creation payload.
pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<()> {
    validate_product_name(&draft.name)?;
    validate_price_cents(draft.price_cents)?;
    validate_stock_level(draft.quantity_on_hand)?;
    Ok(())
}

/// Validates a product name.
///
/// Must be non-empty after trimming and at most [`MAX_NAME_LENGTH`]
/// characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a unit price. Must be strictly positive - the catalog does
/// not carry free items.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is fine (sold out), negative is not.
pub fn validate_stock_level(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity on hand".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a sale quantity: positive and within the per-request cap.
pub fn validate_sale_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}
