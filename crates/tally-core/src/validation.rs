//! # Validation Module
//!
//! Input validation utilities for Tally POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Runs                              │
//! │                                                                         │
//! │  Catalog load ──► validate_barcode, validate_product_name,             │
//! │                   validate_price_cents                                  │
//! │                                                                         │
//! │  Scan accept ───► check_digit_valid (optional misread filter)          │
//! │                                                                         │
//! │  Cart update ───► validate_quantity, validate_cart_size                │
//! │                                                                         │
//! │  Config load ───► validate_confidence                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{check_digit_valid, validate_barcode};
//! use tally_core::types::BarcodeFormat;
//!
//! assert!(validate_barcode("4006381333931").is_ok());
//! assert!(check_digit_valid("4006381333931", BarcodeFormat::Ean13));
//! assert!(!check_digit_valid("4006381333932", BarcodeFormat::Ean13));
//! ```

use crate::error::ValidationError;
use crate::types::BarcodeFormat;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest payload accepted from a linear barcode.
pub const MAX_BARCODE_LEN: usize = 48;

// =============================================================================
// Barcode Validators
// =============================================================================

/// Validates a barcode string for catalog use.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_BARCODE_LEN`] characters
/// - Printable ASCII only (Code 39/93/128 payloads are not purely numeric)
///
/// Check digits are NOT enforced here; shelf labels in the wild often carry
/// in-store codes with arbitrary trailing digits. See [`check_digit_valid`].
pub fn validate_barcode(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::OutOfRange {
            field: "barcode length".to_string(),
            min: 1,
            max: MAX_BARCODE_LEN as i64,
        });
    }

    if !code.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only printable ASCII characters".to_string(),
        });
    }

    Ok(())
}

/// Computes the GS1 mod-10 check digit for a numeric payload.
///
/// Returns `None` if the payload contains a non-digit.
pub fn gs1_check_digit(payload: &str) -> Option<u32> {
    let mut sum = 0u32;
    for (index, c) in payload.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        let weight = if index % 2 == 0 { 3 } else { 1 };
        sum += digit * weight;
    }
    Some((10 - sum % 10) % 10)
}

/// Verifies the trailing check digit of a fixed-length retail code.
///
/// Applies to EAN-13, EAN-8 and UPC-A. Variable-length symbologies and
/// UPC-E (whose check digit is computed on the expanded UPC-A form) always
/// pass; the decoder already validated them internally.
pub fn check_digit_valid(code: &str, format: BarcodeFormat) -> bool {
    verify_check_digit(code, format).is_ok()
}

/// Same as [`check_digit_valid`] but reports why a code failed.
pub fn verify_check_digit(code: &str, format: BarcodeFormat) -> ValidationResult<()> {
    let expected_len = match format {
        BarcodeFormat::Ean13 | BarcodeFormat::Ean8 | BarcodeFormat::UpcA => {
            format.fixed_length().unwrap_or(0)
        }
        _ => return Ok(()),
    };

    if code.len() != expected_len || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: format!("{} requires exactly {} digits", format, expected_len),
        });
    }

    let (payload, check) = code.split_at(expected_len - 1);
    let expected = gs1_check_digit(payload).unwrap_or(0);
    let actual = check.chars().next().and_then(|c| c.to_digit(10)).unwrap_or(0);

    if expected != actual {
        return Err(ValidationError::CheckDigit {
            field: "barcode".to_string(),
            expected,
            actual,
        });
    }

    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product name (1..=200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::OutOfRange {
            field: "name length".to_string(),
            min: 1,
            max: 200,
        });
    }

    Ok(())
}

/// Validates a price in centavos. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value (1..=MAX_ITEM_QUANTITY).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that adding one more unique item keeps the cart within limits.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates a confidence threshold (0.0..=1.0, not NaN).
pub fn validate_confidence(value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidFormat {
            field: "confidence".to_string(),
            reason: format!("{} is outside 0.0..=1.0", value),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("8801234567891").is_ok());
        assert!(validate_barcode("CODE-39 ABC").is_ok());

        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode(&"1".repeat(49)).is_err());
        assert!(validate_barcode("12\u{7}34").is_err());
    }

    #[test]
    fn test_gs1_check_digit() {
        assert_eq!(gs1_check_digit("400638133393"), Some(1));
        assert_eq!(gs1_check_digit("9638507"), Some(4));
        assert_eq!(gs1_check_digit("03600029145"), Some(2));
        assert_eq!(gs1_check_digit("12a"), None);
    }

    #[test]
    fn test_check_digit_valid() {
        assert!(check_digit_valid("4006381333931", BarcodeFormat::Ean13));
        assert!(check_digit_valid("96385074", BarcodeFormat::Ean8));
        assert!(check_digit_valid("036000291452", BarcodeFormat::UpcA));

        assert!(!check_digit_valid("4006381333932", BarcodeFormat::Ean13));
        assert!(!check_digit_valid("400638133393", BarcodeFormat::Ean13));
        assert!(!check_digit_valid("40063813339A1", BarcodeFormat::Ean13));

        // Variable-length symbologies are not checked here
        assert!(check_digit_valid("ANYTHING", BarcodeFormat::Code128));
        assert!(check_digit_valid("01234565", BarcodeFormat::UpcE));
    }

    #[test]
    fn test_verify_check_digit_reports_mismatch() {
        let err = verify_check_digit("4006381333935", BarcodeFormat::Ean13).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CheckDigit {
                expected: 1,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_name("Liempo (Per kg)").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_confidence() {
        assert!(validate_confidence(0.0).is_ok());
        assert!(validate_confidence(0.65).is_ok());
        assert!(validate_confidence(1.0).is_ok());
        assert!(validate_confidence(1.01).is_err());
        assert!(validate_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}
