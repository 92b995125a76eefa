//! # Checkout Error Types
//!
//! What a caller of `compute_and_commit` sees when a checkout does not
//! produce a transaction.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CALLER MUST CHANGE INPUT (never retried)                              │
//! │  ├── EmptyCart        - no line items                                  │
//! │  ├── InvalidCart      - malformed line, tax rate out of range          │
//! │  └── Rejected         - every violated payment-plan rule               │
//! │                                                                         │
//! │  SAFE TO RETRY (nothing was written)                                   │
//! │  └── CommitFailed     - ledger write or credit-state read failed       │
//! │                                                                         │
//! │  STARTUP                                                               │
//! │  └── Config           - configuration file or values unusable          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use kredit_core::{CoreError, ValidationFailure, Violation};
use kredit_db::DbError;

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Checkout failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no line items. Nothing was priced.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line item or the tax rate failed validation.
    #[error("Invalid cart: {0}")]
    InvalidCart(#[source] CoreError),

    /// The payment plan was rejected. Carries every violation.
    #[error("{0}")]
    Rejected(ValidationFailure),

    /// Storage failed while reading credit state or committing.
    ///
    /// The ledger commit is atomic, so a retry is a fresh attempt, never a
    /// duplicate.
    #[error("Commit failed: {0}")]
    CommitFailed(#[from] DbError),

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Returns true if resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::CommitFailed(_))
    }

    /// Returns true for business rejections of the payment plan.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CheckoutError::Rejected(_))
    }

    /// The violation set, for rejected checkouts.
    pub fn violations(&self) -> Option<&ValidationFailure> {
        match self {
            CheckoutError::Rejected(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart => CheckoutError::EmptyCart,
            other => CheckoutError::InvalidCart(other),
        }
    }
}

impl From<ValidationFailure> for CheckoutError {
    fn from(failure: ValidationFailure) -> Self {
        CheckoutError::Rejected(failure)
    }
}

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}

// =============================================================================
// Error Response
// =============================================================================

/// Serializable form of a [`CheckoutError`] for transport layers.
///
/// ```json
/// {
///   "code": "PLAN_REJECTED",
///   "message": "Checkout rejected with 1 violation(s)",
///   "retryable": false,
///   "violations": [
///     { "kind": "CREDIT_LIMIT_EXCEEDED", "available": 50000, "requested": 127440 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EmptyCart,
    InvalidCart,
    PlanRejected,
    CommitFailed,
    ConfigError,
}

impl From<&CheckoutError> for ErrorResponse {
    fn from(err: &CheckoutError) -> Self {
        let (code, message, violations) = match err {
            CheckoutError::EmptyCart => (ErrorCode::EmptyCart, err.to_string(), Vec::new()),
            CheckoutError::InvalidCart(inner) => (ErrorCode::InvalidCart, inner.to_string(), Vec::new()),
            CheckoutError::Rejected(failure) => {
                (ErrorCode::PlanRejected, failure.to_string(), failure.violations.clone())
            }
            CheckoutError::CommitFailed(db_err) => {
                // Log the storage detail, return a generic message
                error!("Checkout commit failed: {}", db_err);
                (
                    ErrorCode::CommitFailed,
                    "The sale could not be saved. Nothing was charged; please try again.".to_string(),
                    Vec::new(),
                )
            }
            CheckoutError::Config(msg) => (ErrorCode::ConfigError, msg.clone(), Vec::new()),
        };

        ErrorResponse {
            code,
            message,
            retryable: err.is_retryable(),
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kredit_core::ValidationError;

    #[test]
    fn test_core_errors_split_empty_cart() {
        assert!(matches!(CheckoutError::from(CoreError::EmptyCart), CheckoutError::EmptyCart));

        let err = CheckoutError::from(CoreError::Validation(ValidationError::Required {
            field: "product_id".into(),
        }));
        assert!(matches!(err, CheckoutError::InvalidCart(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_commit_failures_are_retryable() {
        let stale = CheckoutError::from(DbError::StaleCreditState {
            customer_id: "c1".into(),
        });
        assert!(stale.is_retryable());

        let rejected = CheckoutError::from(ValidationFailure {
            violations: vec![Violation::TermsNotAccepted],
        });
        assert!(!rejected.is_retryable());
        assert!(rejected.is_rejection());
        assert!(!CheckoutError::EmptyCart.is_retryable());
    }

    #[test]
    fn test_error_response_shape() {
        let err = CheckoutError::Rejected(ValidationFailure {
            violations: vec![Violation::CreditLimitExceeded {
                available: 50_000,
                requested: 127_440,
            }],
        });
        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(json["code"], "PLAN_REJECTED");
        assert_eq!(json["retryable"], false);
        assert_eq!(json["violations"][0]["kind"], "CREDIT_LIMIT_EXCEEDED");
        assert_eq!(json["violations"][0]["available"], 50_000);

        let json = serde_json::to_value(ErrorResponse::from(&CheckoutError::EmptyCart)).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert!(json.get("violations").is_none());
    }

    #[test]
    fn test_commit_failure_hides_storage_detail() {
        let err = CheckoutError::CommitFailed(DbError::QueryFailed("disk I/O error".into()));
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, ErrorCode::CommitFailed);
        assert!(response.retryable);
        assert!(!response.message.contains("disk"));
    }
}
