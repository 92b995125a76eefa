//! # Error Types
//!
//! Failures raised before a cart is priced.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kredit-core errors (this file)                                        │
//! │  ├── CoreError          - Cart / arithmetic failures                   │
//! │  └── ValidationError    - Field-level input validation failures        │
//! │                                                                         │
//! │  kredit-core plan rules (plan.rs)                                      │
//! │  └── ValidationFailure  - Every violated payment-plan rule at once     │
//! │                                                                         │
//! │  kredit-db errors (separate crate)                                     │
//! │  └── DbError            - Database operation failures                  │
//! │                                                                         │
//! │  kredit-checkout errors                                                │
//! │  └── CheckoutError      - What the caller of compute_and_commit sees   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages carry the line index, product and limits involved, so a
//! terminal can show them without further lookups.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Raised by the cart aggregator before any pricing happens. None of these
/// are retryable: the caller must change the cart.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no line items.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout pressed with empty cart
    ///      │
    ///      ▼
    /// cart::subtotal(&[]) → EmptyCart
    ///      │
    ///      ▼
    /// No pricing, no validation, no ledger write
    /// ```
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A single line item failed validation.
    #[error("Line {index} ({product_id}): {source}")]
    InvalidLineItem {
        index: usize,
        product_id: String,
        #[source]
        source: ValidationError,
    },

    /// An amount does not fit in 64-bit minor units.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
///
/// Used for early validation of line items and configured terms.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two credit plans with the same duration).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
