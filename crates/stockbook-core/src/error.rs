//! # Error Types
//!
//! Validation errors for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  stockbook-core (this file)                                   │
//! │  └── ValidationError  - malformed/missing input               │
//! │                                                               │
//! │  stockbook-db                                                 │
//! │  ├── DbError          - storage failures                      │
//! │  ├── ReconcileError   - sale submission outcomes              │
//! │  └── CatalogError     - product lifecycle outcomes            │
//! │                                                               │
//! │  ValidationError feeds into ReconcileError::InvalidRequest    │
//! │  and CatalogError::Invalid so the caller can map each kind    │
//! │  to a distinct client-facing signal.                          │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Input validation errors.
///
/// Raised before any business logic or storage access runs. A failed
/// validation never has side effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g. a malformed UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;
