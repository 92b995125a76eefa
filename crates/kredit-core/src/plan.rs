//! # Plan Validator
//!
//! Decides whether a priced checkout may be committed.
//!
//! ## Rules
//! ```text
//! ┌──────────┬───────────────────────────────────────────────────────────────┐
//! │ Plan     │ Requirements                                                  │
//! ├──────────┼───────────────────────────────────────────────────────────────┤
//! │ Full     │ none (no credit exposure)                                     │
//! │ Partial  │ customer • min ≤ pct ≤ max • due date after today •           │
//! │          │ terms accepted • outstanding + deferred ≤ limit               │
//! │ Credit   │ customer • offered duration • outstanding + base ≤ limit      │
//! └──────────┴───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every applicable rule is checked and every violation is reported, in a
//! fixed order, so the cashier can correct the whole form at once.
//!
//! ## Typestate
//! A successful validation yields an [`AcceptedCheckout`]. It can only be
//! built here, and it is the only input the transaction ledger accepts, so a
//! rejected checkout cannot reach storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::terms::CheckoutTerms;
use crate::types::{CustomerCreditState, PaymentPlan, PriceBreakdown};

// =============================================================================
// Violations
// =============================================================================

/// A single violated payment-plan rule, with the numbers that explain it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    /// No customer to attribute the deferred amount to, or the given
    /// customer id does not exist.
    #[error("A customer is required for this payment plan")]
    MissingCustomer { customer_id: Option<String> },

    #[error("Partial payment must be between {min}% and {max}% (got {percentage}%)")]
    PercentageOutOfRange { percentage: u32, min: u32, max: u32 },

    #[error("A due date is required for the deferred amount")]
    MissingDueDate,

    #[error("Due date {due_date} must be after {transaction_date}")]
    DueDateNotInFuture {
        #[ts(as = "String")]
        due_date: NaiveDate,
        #[ts(as = "String")]
        transaction_date: NaiveDate,
    },

    #[error("Customer must accept the payment terms")]
    TermsNotAccepted,

    /// `available` is `limit - outstanding`, `requested` the amount to defer.
    #[error("Credit limit exceeded: available {available}, requested {requested}")]
    CreditLimitExceeded { available: i64, requested: i64 },

    #[error("Credit duration of {months} months is not offered (allowed: {allowed:?})")]
    InvalidCreditDuration { months: u32, allowed: Vec<u32> },
}

/// Field-less discriminant of a [`Violation`], for matching and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    MissingCustomer,
    PercentageOutOfRange,
    MissingDueDate,
    DueDateNotInFuture,
    TermsNotAccepted,
    CreditLimitExceeded,
    InvalidCreditDuration,
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Violation::MissingCustomer { .. } => ViolationKind::MissingCustomer,
            Violation::PercentageOutOfRange { .. } => ViolationKind::PercentageOutOfRange,
            Violation::MissingDueDate => ViolationKind::MissingDueDate,
            Violation::DueDateNotInFuture { .. } => ViolationKind::DueDateNotInFuture,
            Violation::TermsNotAccepted => ViolationKind::TermsNotAccepted,
            Violation::CreditLimitExceeded { .. } => ViolationKind::CreditLimitExceeded,
            Violation::InvalidCreditDuration { .. } => ViolationKind::InvalidCreditDuration,
        }
    }
}

/// The complete set of violations for a rejected checkout. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[error("Checkout rejected with {} violation(s)", .violations.len())]
pub struct ValidationFailure {
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn contains(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.violations.iter().map(Violation::kind).collect()
    }
}

// =============================================================================
// Accepted Checkout
// =============================================================================

/// A checkout that passed every plan rule.
///
/// Holds the exact breakdown, plan and customer snapshot that were
/// validated. The ledger commits against `customer`'s balance as read here
/// and refuses if it changed in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedCheckout {
    breakdown: PriceBreakdown,
    plan: PaymentPlan,
    customer: Option<CustomerCreditState>,
    terms_accepted: bool,
    transaction_date: NaiveDate,
}

impl AcceptedCheckout {
    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn plan(&self) -> &PaymentPlan {
        &self.plan
    }

    pub fn customer(&self) -> Option<&CustomerCreditState> {
        self.customer.as_ref()
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(|c| c.customer_id.as_str())
    }

    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    pub fn transaction_date(&self) -> NaiveDate {
        self.transaction_date
    }

    /// Outstanding balance the customer will carry once committed.
    ///
    /// `None` for walk-in sales.
    pub fn balance_after(&self) -> Option<i64> {
        self.customer
            .as_ref()
            .and_then(|c| c.outstanding_balance_cents.checked_add(self.breakdown.amount_deferred_cents))
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Checks priced checkouts against a set of [`CheckoutTerms`].
#[derive(Debug, Clone)]
pub struct PlanValidator<'a> {
    terms: &'a CheckoutTerms,
    requested_customer: Option<String>,
}

impl<'a> PlanValidator<'a> {
    pub fn new(terms: &'a CheckoutTerms) -> Self {
        PlanValidator {
            terms,
            requested_customer: None,
        }
    }

    /// Records the customer id the caller asked for.
    ///
    /// If the lookup for that id came back empty, validation reports
    /// `MissingCustomer` with the id, whatever the plan.
    pub fn expecting_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.requested_customer = Some(customer_id.into());
        self
    }

    /// Validates `breakdown` and `plan` for `customer` on `transaction_date`.
    ///
    /// ## Violation Order
    /// customer, percentage, due date, terms, duration, credit limit.
    pub fn validate(
        &self,
        breakdown: PriceBreakdown,
        plan: PaymentPlan,
        customer: Option<CustomerCreditState>,
        terms_accepted: bool,
        transaction_date: NaiveDate,
    ) -> Result<AcceptedCheckout, ValidationFailure> {
        let mut violations = Vec::new();

        if customer.is_none() && (plan.requires_customer() || self.requested_customer.is_some()) {
            violations.push(Violation::MissingCustomer {
                customer_id: self.requested_customer.clone(),
            });
        }

        match &plan {
            PaymentPlan::Full { .. } => {}
            PaymentPlan::Partial {
                percentage, due_date, ..
            } => {
                if !self.terms.partial_in_range(*percentage) {
                    violations.push(Violation::PercentageOutOfRange {
                        percentage: *percentage,
                        min: self.terms.partial_min_percent,
                        max: self.terms.partial_max_percent,
                    });
                }

                match due_date {
                    None => violations.push(Violation::MissingDueDate),
                    Some(due) if *due <= transaction_date => {
                        violations.push(Violation::DueDateNotInFuture {
                            due_date: *due,
                            transaction_date,
                        })
                    }
                    Some(_) => {}
                }

                if !terms_accepted {
                    violations.push(Violation::TermsNotAccepted);
                }

                if let Some(state) = &customer {
                    check_credit_limit(state, breakdown.amount_deferred(), &mut violations);
                }
            }
            PaymentPlan::Credit { duration_months } => {
                if self.terms.credit_rate(*duration_months).is_none() {
                    violations.push(Violation::InvalidCreditDuration {
                        months: *duration_months,
                        allowed: self.terms.allowed_durations(),
                    });
                }

                if let Some(state) = &customer {
                    check_credit_limit(state, breakdown.base_total(), &mut violations);
                }
            }
        }

        if !violations.is_empty() {
            return Err(ValidationFailure { violations });
        }

        Ok(AcceptedCheckout {
            breakdown,
            plan,
            customer,
            terms_accepted,
            transaction_date,
        })
    }
}

fn check_credit_limit(state: &CustomerCreditState, requested: Money, violations: &mut Vec<Violation>) {
    if !state.can_absorb(requested) {
        violations.push(Violation::CreditLimitExceeded {
            available: state.available_credit().cents(),
            requested: requested.cents(),
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
