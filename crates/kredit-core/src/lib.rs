//! # kredit-core: Pure Business Logic for Kredit POS
//!
//! This crate is the checkout engine of Kredit POS. It turns a cart and a
//! payment plan into a priced, validated checkout, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kredit POS Checkout                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    kredit-checkout                              │   │
//! │  │        compute_and_commit(request) / preview(request)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kredit-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐   ┌───────────┐   ┌────────────┐                │   │
//! │  │   │   cart   │──►│  pricing  │──►│    plan    │                │   │
//! │  │   │ subtotal │   │ breakdown │   │ validator  │                │   │
//! │  │   └──────────┘   └───────────┘   └─────┬──────┘                │   │
//! │  │                                        │ AcceptedCheckout       │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK      │                        │   │
//! │  └────────────────────────────────────────┼────────────────────────┘   │
//! │                                           │                             │
//! │  ┌────────────────────────────────────────▼────────────────────────┐   │
//! │  │              kredit-db (TransactionLedger)                      │   │
//! │  │          atomic insert + outstanding balance update             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, PaymentPlan, Transaction, ...)
//! - [`money`] - Money and Rate types with integer arithmetic
//! - [`cart`] - CartAggregator: line items → subtotal
//! - [`pricing`] - PricingEngine: subtotal + plan → PriceBreakdown
//! - [`plan`] - PlanValidator: breakdown + customer → accept / reject
//! - [`terms`] - Configurable business terms (partial bounds, credit rates)
//! - [`validation`] - Field-level input validators
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, byte for byte
//! 2. **Integer Money**: all monetary values are minor units (i64)
//! 3. **Round Once**: each derived amount is rounded exactly once, half-up
//! 4. **Report Everything**: plan validation returns every violation at once
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kredit_core::{
//!     cart, CheckoutTerms, CustomerCreditState, LineItem, PaymentPlan, PlanValidator,
//!     PricingEngine, Rate,
//! };
//!
//! let terms = CheckoutTerms::default();
//! let items = vec![LineItem::new("RICE-25KG", 50_000, 2)];
//!
//! let subtotal = cart::subtotal(&items).unwrap();
//! let plan = PaymentPlan::Credit { duration_months: 6 };
//! let breakdown = PricingEngine::new(&terms).price(subtotal, Rate::from_bps(1800), true, &plan);
//!
//! assert_eq!(breakdown.interest_cents, 9_440);
//! assert_eq!(breakdown.amount_deferred_cents, 127_440);
//!
//! let customer = CustomerCreditState::new("cust-1", 500_000, 0);
//! let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
//! let accepted = PlanValidator::new(&terms)
//!     .validate(breakdown, plan, Some(customer), true, today)
//!     .unwrap();
//! assert_eq!(accepted.balance_after(), Some(127_440));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod plan;
pub mod pricing;
pub mod terms;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use plan::{AcceptedCheckout, PlanValidator, ValidationFailure, Violation, ViolationKind};
pub use pricing::PricingEngine;
pub use terms::{CheckoutTerms, CreditPlanTerm};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a transaction printable on one receipt.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest cart subtotal (and unit price) the engine prices, in minor units.
///
/// Tax and interest are each capped at 100%, so a base total never exceeds
/// four times this value and every derived amount stays inside i64.
pub const MAX_SUBTOTAL_CENTS: i64 = 1_000_000_000_000_000;
