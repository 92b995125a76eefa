//! # Repository Module
//!
//! Read-side database access for Kredit POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CheckoutService                                                       │
//! │       │                                                                 │
//! │       │  db.customers().get_credit_state(id)   ← fresh read, no cache  │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── insert(&self, customer)                                           │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── get_credit_state(&self, id)                                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Writes to outstanding_balance_cents never go through a repository:    │
//! │  they belong to TransactionLedger.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`customer::CustomerRepository`] - Customer records and credit state
//! - [`transaction::TransactionRepository`] - Committed transaction queries
//! - [`ledger_event::LedgerEventRepository`] - Ledger event outbox

pub mod customer;
pub mod ledger_event;
pub mod transaction;
