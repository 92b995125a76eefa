//! # kredit-db: Database Layer for Kredit POS
//!
//! Persistence for the checkout engine. SQLite storage via sqlx, with the
//! transaction ledger as the single writer of customer balances.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kredit POS Data Flow                             │
//! │                                                                         │
//! │  CheckoutService::compute_and_commit                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kredit-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌─────────────┐ │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded)  │ │   │
//! │  │   │               │    │ CustomerRepo       │  │             │ │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo    │  │ 001_init    │ │   │
//! │  │   │               │    │ LedgerEventRepo    │  │             │ │   │
//! │  │   └───────┬───────┘    └────────────────────┘  └─────────────┘ │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼─────────────────────────────────────────────────┐  │   │
//! │  │   │ TransactionLedger (ledger.rs)                           │  │   │
//! │  │   │ CAS balance update + transaction + items + event        │  │   │
//! │  │   │ in ONE database transaction                             │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`ledger`] - Atomic checkout commit
//! - [`repository`] - Read-side repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kredit_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kredit.db")).await?;
//!
//! let state = db.customers().get_credit_state(&customer_id).await?;
//! let tx = db.ledger().commit(items, accepted, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::TransactionLedger;
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::ledger_event::LedgerEventRepository;
pub use repository::transaction::TransactionRepository;
