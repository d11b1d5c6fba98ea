//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Catalog / cart rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-scanner errors (separate crate)                                 │
//! │  └── ScanError        - Camera, decoder and state machine failures     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → notification shown to cashier     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No catalog product carries the scanned barcode.
    ///
    /// ## When This Occurs
    /// - Shelf label printed for a product that was removed from the catalog
    /// - Decoder misread that still passed the confidence threshold
    #[error("No product with barcode {0}")]
    UnknownBarcode(String),

    /// Product cannot be found by id.
    #[error("Product not found: {0}")]
    ProductNotFound(u32),

    /// Insufficient stock to add to the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan (already 100 in cart)
    ///      │
    ///      ▼
    /// Check stock: available=100
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Bacon", available: 100, requested: 101 }
    ///      │
    ///      ▼
    /// UI shows: "Only 100 Bacon in stock"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Product is not in the cart.
    #[error("Product {0} not in cart")]
    NotInCart(u32),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-digit barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Check digit does not match the payload.
    #[error("{field} check digit mismatch: expected {expected}, got {actual}")]
    CheckDigit {
        field: String,
        expected: u32,
        actual: u32,
    },

    /// Duplicate value (e.g., two products sharing a barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Bacon (Per kg)".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Bacon (Per kg): available 3, requested 5"
        );
        assert_eq!(
            CoreError::UnknownBarcode("123".into()).to_string(),
            "No product with barcode 123"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::CheckDigit {
            field: "barcode".to_string(),
            expected: 7,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "barcode check digit mismatch: expected 7, got 1"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
