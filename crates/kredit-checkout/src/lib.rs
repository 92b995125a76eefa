//! # Kredit Checkout
//!
//! Orchestration layer for Kredit POS: turns a terminal's checkout request
//! into a committed transaction or a complete list of reasons it cannot be
//! committed.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Terminal / front end                            │
//! └───────────────────────────────────┬─────────────────────────────────────┘
//!                                     │ CheckoutRequest
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CheckoutService (this crate)                     │
//! │   preview()            compute_and_commit()          CustomerLocks      │
//! └──────────────┬───────────────────────────────────────────┬──────────────┘
//!                │ pure                                      │ I/O
//!                ▼                                           ▼
//! ┌────────────────────────────────┐     ┌──────────────────────────────────┐
//! │ kredit-core                    │     │ kredit-db                        │
//! │ cart • pricing • plan rules    │     │ credit reads • TransactionLedger │
//! └────────────────────────────────┘     └──────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use kredit_checkout::{CheckoutConfig, CheckoutService};
//! use kredit_core::{LineItem, PaymentPlan};
//!
//! # async fn run() -> Result<(), kredit_checkout::CheckoutError> {
//! kredit_checkout::init_tracing();
//!
//! let config = CheckoutConfig::load(None)?;
//! let service = CheckoutService::open(&config).await?;
//!
//! let request = service
//!     .new_request(vec![LineItem::new("SKU-RICE-25KG", 25_000, 4)], PaymentPlan::Credit { duration_months: 6 })
//!     .with_customer("3f1c2d4e-0000-4000-8000-000000000001");
//!
//! let transaction = service.compute_and_commit(request).await?;
//! println!("Receipt {}", transaction.receipt_number);
//! # Ok(())
//! # }
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod locks;
pub mod service;

pub use config::{CheckoutConfig, DatabaseSettings, PricingSettings};
pub use error::{CheckoutError, CheckoutResult, ErrorCode, ErrorResponse};
pub use locks::{CustomerGuard, CustomerLocks};
pub use service::{CheckoutRequest, CheckoutService};

/// Installs the fmt subscriber for a terminal process.
///
/// ## Log Levels
/// - Default: `info,kredit=debug,sqlx=warn`
/// - Override with the `RUST_LOG` environment variable
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kredit=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .try_init();
}
