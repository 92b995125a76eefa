//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutError::CommitFailed ← Retryable, no partial state             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Storage failures, as seen by the checkout layer.
///
/// Every variant means the attempted write did not happen: the ledger runs
/// inside one SQLite transaction.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the row.
    ///
    /// ## When This Occurs
    /// - Reused transaction or customer id
    /// - Receipt number collision (same day, same 8-hex prefix)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A referenced row is missing.
    ///
    /// ## When This Occurs
    /// - Transaction attributed to a customer that no longer exists
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint refused the row (negative balance, unbalanced
    /// breakdown, unknown plan kind).
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// COMMIT itself failed. The open transaction was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The customer's balance changed after it was validated.
    ///
    /// ## When This Occurs
    /// ```text
    /// Terminal A: read balance 0 ──► validate ──► commit (balance := 127,440)
    /// Terminal B: read balance 0 ──► validate ──────────────► commit
    ///                                                           │
    ///                      WHERE outstanding_balance_cents = 0  ✗ 0 rows
    ///                                                           ▼
    ///                                                 StaleCreditState
    /// ```
    /// Nothing was written. Re-reading the customer and validating again is
    /// safe.
    #[error("Credit state of customer {customer_id} changed since validation")]
    StaleCreditState { customer_id: String },

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// A stored row that does not map back to a domain value.
    pub fn corrupt_row(table: &str, id: &str, reason: impl std::fmt::Display) -> Self {
        DbError::Internal(format!("{} row {} is malformed: {}", table, id, reason))
    }
}

/// Classifies sqlx failures.
///
/// ```text
/// Database(kind = UniqueViolation)      → UniqueViolation { field: "<table>.<column>" }
/// Database(kind = ForeignKeyViolation)  → ForeignKeyViolation
/// Database(kind = CheckViolation)       → ConstraintViolation
/// Database(other)                       → QueryFailed
/// PoolTimedOut                          → PoolExhausted
/// PoolClosed / Io                       → ConnectionFailed
/// RowNotFound                           → NotFound
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                        field: message
                            .rsplit(": ")
                            .next()
                            .unwrap_or("unknown")
                            .to_string(),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("Event payload serialization failed: {}", err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
