//! # Checkout Service
//!
//! Runs one checkout from cart to committed transaction.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  compute_and_commit(request)                                           │
//! │                                                                         │
//! │  1. cart::subtotal(items)            EmptyCart / InvalidCart           │
//! │  2. PricingEngine::price             pure, no I/O                      │
//! │  3. CustomerLocks::acquire(id)       only when a customer is named     │
//! │  4. customers().get_credit_state     fresh read, never cached          │
//! │  5. PlanValidator::validate          Rejected(all violations)          │
//! │  6. TransactionLedger::commit        CommitFailed (retryable)          │
//! │  7. release lock                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written before step 6, and step 6 is all-or-nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kredit_core::cart;
use kredit_core::validation::validate_rate_bps;
use kredit_core::{
    CheckoutTerms, CoreError, LineItem, PaymentPlan, PlanValidator, PriceBreakdown, PricingEngine, Rate, Transaction,
};
use kredit_db::Database;

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::locks::CustomerLocks;

// =============================================================================
// Request
// =============================================================================

/// Everything a terminal submits for one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<LineItem>,
    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,
    /// When false no tax is charged; the rate is still recorded.
    pub include_tax: bool,
    pub plan: PaymentPlan,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub terms_accepted: bool,
}

impl CheckoutRequest {
    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_tax_rate(mut self, bps: u32) -> Self {
        self.tax_rate_bps = bps;
        self
    }

    pub fn excluding_tax(mut self) -> Self {
        self.include_tax = false;
        self
    }

    pub fn accept_terms(mut self) -> Self {
        self.terms_accepted = true;
        self
    }

    fn tax_rate(&self) -> CheckoutResult<Rate> {
        validate_rate_bps("tax_rate_bps", self.tax_rate_bps).map_err(CoreError::from)?;
        Ok(Rate::from_bps(self.tax_rate_bps))
    }
}

// =============================================================================
// Service
// =============================================================================

/// Checkout entry point shared by every terminal.
///
/// Clones share the database pool, the terms and the customer locks, so a
/// clone per request handler is the intended use.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    terms: Arc<CheckoutTerms>,
    default_tax_rate: Rate,
    locks: CustomerLocks,
}

impl CheckoutService {
    /// Creates a service over an open database.
    pub fn new(db: Database, config: &CheckoutConfig) -> Self {
        CheckoutService {
            db,
            terms: Arc::new(config.terms.clone()),
            default_tax_rate: config.pricing.default_tax_rate(),
            locks: CustomerLocks::new(),
        }
    }

    /// Opens the configured database and creates a service over it.
    pub async fn open(config: &CheckoutConfig) -> CheckoutResult<Self> {
        let db = Database::new(config.db_config()?)
            .await
            .map_err(|e| CheckoutError::Config(format!("Failed to open database: {}", e)))?;

        Ok(Self::new(db, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn terms(&self) -> &CheckoutTerms {
        &self.terms
    }

    /// Starts a request with the configured tax rate, tax included, no
    /// customer and terms not yet accepted.
    pub fn new_request(&self, items: Vec<LineItem>, plan: PaymentPlan) -> CheckoutRequest {
        CheckoutRequest {
            items,
            tax_rate_bps: self.default_tax_rate.bps(),
            include_tax: true,
            plan,
            customer_id: None,
            terms_accepted: false,
        }
    }

    /// Prices a request for display. No customer read, no validation, no
    /// writes.
    pub fn preview(&self, request: &CheckoutRequest) -> CheckoutResult<PriceBreakdown> {
        let subtotal = cart::subtotal(&request.items)?;
        let tax_rate = request.tax_rate()?;

        Ok(PricingEngine::new(&self.terms).price(subtotal, tax_rate, request.include_tax, &request.plan))
    }

    /// Prices, validates and commits a checkout.
    ///
    /// ## Errors
    /// - `EmptyCart` / `InvalidCart`: fix the cart
    /// - `Rejected`: every plan rule the request violates
    /// - `CommitFailed`: nothing was written; the request may be resubmitted
    pub async fn compute_and_commit(&self, request: CheckoutRequest) -> CheckoutResult<Transaction> {
        self.checkout_at(request, Utc::now()).await
    }

    async fn checkout_at(&self, request: CheckoutRequest, now: DateTime<Utc>) -> CheckoutResult<Transaction> {
        let breakdown = self.preview(&request)?;

        debug!(
            subtotal = breakdown.subtotal_cents,
            base_total = breakdown.base_total_cents,
            plan = ?request.plan.kind(),
            "Checkout priced"
        );

        let CheckoutRequest {
            items,
            plan,
            customer_id,
            terms_accepted,
            ..
        } = request;

        // Held from the credit read through the commit
        let _guard = match &customer_id {
            Some(id) => Some(self.locks.acquire(id).await),
            None => None,
        };

        let customer = match &customer_id {
            Some(id) => self.db.customers().get_credit_state(id).await?,
            None => None,
        };

        let mut validator = PlanValidator::new(&self.terms);
        if let Some(id) = &customer_id {
            validator = validator.expecting_customer(id.as_str());
        }

        let accepted = validator
            .validate(breakdown, plan, customer, terms_accepted, now.date_naive())
            .map_err(|failure| {
                warn!(
                    customer_id = ?customer_id,
                    violations = ?failure.kinds(),
                    "Checkout rejected"
                );
                failure
            })?;

        let transaction = self.db.ledger().commit(items, accepted, now).await?;

        info!(
            receipt_number = %transaction.receipt_number,
            due_now = transaction.breakdown.amount_due_now_cents,
            deferred = transaction.breakdown.amount_deferred_cents,
            "Checkout complete"
        );

        Ok(transaction)
    }
}
