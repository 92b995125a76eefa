//! # Validation Module
//!
//! Field-level input validators for Kredit POS checkout.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (field checks)                                   │
//! │  ├── Line items: product ref, quantity, unit price                     │
//! │  └── Configured terms: rate and percentage bounds                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: PlanValidator (plan.rs)                                      │
//! │  └── Business rules across breakdown + plan + customer                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (outstanding_balance_cents >= 0)                            │
//! │  └── UNIQUE / foreign key constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kredit_core::validation::{validate_product_ref, validate_quantity};
//!
//! validate_product_ref("RICE-25KG").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_SUBTOTAL_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product reference on a line item.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
///
/// ## Example
/// ```rust
/// use kredit_core::validation::validate_product_ref;
///
/// assert!(validate_product_ref("COKE-330").is_ok());
/// assert!(validate_product_ref("  ").is_err());
/// ```
pub fn validate_product_ref(product_id: &str) -> ValidationResult<()> {
    let product_id = product_id.trim();

    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if product_id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
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

/// Validates a unit price in minor units.
///
/// ## Rules
/// - Must be non-negative (zero is a free item)
/// - Must not exceed MAX_SUBTOTAL_CENTS
///
/// ## Example
/// ```rust
/// use kredit_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_SUBTOTAL_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_SUBTOTAL_CENTS,
        });
    }

    Ok(())
}

/// Validates a rate in basis points (tax rate, credit interest rate).
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates the configured partial-payment bounds.
///
/// ## Rules
/// - `1 <= min <= max <= 99`: a partial plan must collect something now and
///   defer something
pub fn validate_percent_bounds(min: u32, max: u32) -> ValidationResult<()> {
    for (field, value) in [("partial_min_percent", min), ("partial_max_percent", max)] {
        if !(1..=99).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 1,
                max: 99,
            });
        }
    }

    if min > max {
        return Err(ValidationError::InvalidFormat {
            field: "partial_min_percent".to_string(),
            reason: format!("minimum {}% is above maximum {}%", min, max),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of lines).
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart_items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
