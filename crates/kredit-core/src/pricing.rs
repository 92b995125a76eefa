//! # Pricing Engine
//!
//! Turns a subtotal and a payment plan into a [`PriceBreakdown`].
//!
//! ## Algorithm
//! ```text
//! subtotal ──┬──────────────────────────────────────────────┐
//!            │                                              │
//!            ├─► tax      = include_tax ? ⌊subtotal × tax⌉ : 0
//!            │                                              │
//!            ├─► interest = Credit ? ⌊(subtotal + tax) × rate(months)⌉ : 0
//!            │                                              ▼
//!            └─────────────────────────► base = subtotal + tax + interest
//!                                                           │
//!                    Full    → due_now = base               │
//!                    Partial → due_now = ⌊base × pct / 100⌉ ◄┘
//!                    Credit  → due_now = 0
//!
//!                    deferred = base − due_now
//! ```
//! `⌊x⌉` is round-half-up to the nearest minor unit. Each derived amount is
//! rounded exactly once and `deferred` is obtained by subtraction, so
//! `due_now + deferred == base` holds for every input.
//!
//! Pricing is total: it never fails and never rejects. Out-of-range
//! percentages and unknown durations are priced as given and left for the
//! [`PlanValidator`](crate::plan::PlanValidator) to reject.

use crate::cart;
use crate::error::CoreResult;
use crate::money::{Money, Rate};
use crate::terms::CheckoutTerms;
use crate::types::{PaymentPlan, PriceBreakdown, Transaction};

/// Prices checkouts against a set of [`CheckoutTerms`].
#[derive(Debug, Clone, Copy)]
pub struct PricingEngine<'a> {
    terms: &'a CheckoutTerms,
}

impl<'a> PricingEngine<'a> {
    pub fn new(terms: &'a CheckoutTerms) -> Self {
        PricingEngine { terms }
    }

    /// Computes the breakdown for `subtotal` under `plan`.
    ///
    /// The credit interest rate is looked up from the terms by duration; a
    /// duration that is not offered prices with zero interest.
    ///
    /// `subtotal` comes from [`cart::subtotal`] and `tax_rate` is at most
    /// 100%; inside those bounds no amount overflows.
    ///
    /// ## Example
    /// ```rust
    /// use kredit_core::{CheckoutTerms, Money, PaymentPlan, PricingEngine, Rate, SettlementMethod};
    ///
    /// let terms = CheckoutTerms::default();
    /// let plan = PaymentPlan::Full { method: SettlementMethod::Cash };
    /// let b = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), true, &plan);
    ///
    /// assert_eq!(b.tax_cents, 18_000);
    /// assert_eq!(b.amount_due_now_cents, 118_000);
    /// assert_eq!(b.amount_deferred_cents, 0);
    /// ```
    pub fn price(&self, subtotal: Money, tax_rate: Rate, include_tax: bool, plan: &PaymentPlan) -> PriceBreakdown {
        let interest_rate = match plan {
            PaymentPlan::Credit { duration_months } => {
                self.terms.credit_rate(*duration_months).unwrap_or_else(Rate::zero)
            }
            _ => Rate::zero(),
        };

        compute(subtotal, tax_rate, include_tax, interest_rate, plan)
    }
}

/// Breakdown arithmetic with an explicit interest rate.
///
/// Shared by live pricing and audit re-pricing, which uses the rate recorded
/// on the stored breakdown instead of today's table.
fn compute(
    subtotal: Money,
    tax_rate: Rate,
    include_tax: bool,
    interest_rate: Rate,
    plan: &PaymentPlan,
) -> PriceBreakdown {
    let tax = if include_tax {
        subtotal.apply_rate(tax_rate)
    } else {
        Money::zero()
    };

    let (interest_rate, interest) = match plan {
        PaymentPlan::Credit { .. } => (interest_rate, (subtotal + tax).apply_rate(interest_rate)),
        _ => (Rate::zero(), Money::zero()),
    };

    let base_total = subtotal + tax + interest;

    let due_now = match plan {
        PaymentPlan::Full { .. } => base_total,
        PaymentPlan::Partial { percentage, .. } => base_total.percentage(*percentage),
        PaymentPlan::Credit { .. } => Money::zero(),
    };

    let deferred = base_total - due_now;

    PriceBreakdown {
        subtotal_cents: subtotal.cents(),
        tax_rate_bps: tax_rate.bps(),
        tax_included: include_tax,
        tax_cents: tax.cents(),
        interest_rate_bps: interest_rate.bps(),
        interest_cents: interest.cents(),
        base_total_cents: base_total.cents(),
        amount_due_now_cents: due_now.cents(),
        amount_deferred_cents: deferred.cents(),
    }
}

// =============================================================================
// Audit Re-pricing
// =============================================================================

impl Transaction {
    /// Recomputes the breakdown from the stored items, plan and recorded rates.
    pub fn reprice(&self) -> CoreResult<PriceBreakdown> {
        let subtotal = cart::subtotal(&self.items)?;
        Ok(compute(
            subtotal,
            self.breakdown.tax_rate(),
            self.breakdown.tax_included,
            self.breakdown.interest_rate(),
            &self.plan,
        ))
    }

    /// True when re-pricing reproduces the stored breakdown exactly.
    pub fn has_consistent_totals(&self) -> bool {
        matches!(self.reprice(), Ok(breakdown) if breakdown == self.breakdown)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::CreditPlanTerm;
    use crate::types::{LineItem, SettlementMethod, TransactionStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn due() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 3, 8)
    }

    fn partial(percentage: u32) -> PaymentPlan {
        PaymentPlan::Partial {
            method: SettlementMethod::Cash,
            percentage,
            due_date: due(),
        }
    }

    #[test]
    fn test_partial_fifty_percent() {
        let terms = CheckoutTerms::default();
        let b = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), true, &partial(50));

        assert_eq!(b.tax_cents, 18_000);
        assert_eq!(b.interest_cents, 0);
        assert_eq!(b.interest_rate_bps, 0);
        assert_eq!(b.base_total_cents, 118_000);
        assert_eq!(b.amount_due_now_cents, 59_000);
        assert_eq!(b.amount_deferred_cents, 59_000);
    }

    #[test]
    fn test_credit_six_months() {
        let terms = CheckoutTerms::default();
        let plan = PaymentPlan::Credit { duration_months: 6 };
        let b = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), true, &plan);

        assert_eq!(b.interest_rate_bps, 800);
        assert_eq!(b.interest_cents, 9_440);
        assert_eq!(b.base_total_cents, 127_440);
        assert_eq!(b.amount_due_now_cents, 0);
        assert_eq!(b.amount_deferred_cents, 127_440);
    }

    #[test]
    fn test_tax_excluded() {
        let terms = CheckoutTerms::default();
        let plan = PaymentPlan::Full {
            method: SettlementMethod::Card,
        };
        let b = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), false, &plan);

        assert_eq!(b.tax_cents, 0);
        assert!(!b.tax_included);
        assert_eq!(b.tax_rate_bps, 1800);
        assert_eq!(b.base_total_cents, 100_000);
    }

    #[test]
    fn test_largest_cart_prices_without_overflow() {
        let mut terms = CheckoutTerms::default();
        terms.credit_plans.push(CreditPlanTerm::new(36, 10_000));

        let items = vec![LineItem::new("PALLET", crate::MAX_SUBTOTAL_CENTS, 1)];
        let subtotal = cart::subtotal(&items).unwrap();
        let engine = PricingEngine::new(&terms);

        let b = engine.price(subtotal, Rate::from_bps(10_000), true, &PaymentPlan::Credit { duration_months: 36 });
        assert_eq!(b.base_total_cents, 4 * crate::MAX_SUBTOTAL_CENTS);
        assert!(b.is_balanced());

        let b = engine.price(subtotal, Rate::from_bps(10_000), true, &partial(33));
        assert_eq!(b.base_total_cents, 2 * crate::MAX_SUBTOTAL_CENTS);
        assert!(b.is_balanced());
    }

    #[test]
    fn test_unknown_duration_prices_without_interest() {
        let terms = CheckoutTerms::default();
        let plan = PaymentPlan::Credit { duration_months: 9 };
        let b = PricingEngine::new(&terms).price(Money::from_cents(10_000), Rate::zero(), false, &plan);

        assert_eq!(b.interest_cents, 0);
        assert_eq!(b.amount_deferred_cents, 10_000);
    }

    #[test]
    fn test_rounding_half_up() {
        let terms = CheckoutTerms::default();
        let full = PaymentPlan::Full {
            method: SettlementMethod::Cash,
        };

        // 25 × 2% = 0.50 → 1
        let b = PricingEngine::new(&terms).price(Money::from_cents(25), Rate::from_bps(200), true, &full);
        assert_eq!(b.tax_cents, 1);

        // 24 × 2% = 0.48 → 0
        let b = PricingEngine::new(&terms).price(Money::from_cents(24), Rate::from_bps(200), true, &full);
        assert_eq!(b.tax_cents, 0);

        // base 11 at 50% → 5.5 → 6 now, 5 deferred
        let b = PricingEngine::new(&terms).price(Money::from_cents(11), Rate::zero(), false, &partial(50));
        assert_eq!(b.amount_due_now_cents, 6);
        assert_eq!(b.amount_deferred_cents, 5);
    }

    #[test]
    fn test_due_now_plus_deferred_equals_base() {
        let terms = CheckoutTerms::default();
        let engine = PricingEngine::new(&terms);
        let subtotals = [1, 7, 99, 1_001, 33_333, 100_000, 987_654_321];
        let tax_rates = [0, 1, 825, 1800, 2500];
        let mut plans = vec![
            PaymentPlan::Full {
                method: SettlementMethod::Mobile,
            },
            PaymentPlan::Credit { duration_months: 3 },
            PaymentPlan::Credit { duration_months: 24 },
        ];
        plans.extend((29..=91).step_by(3).map(partial));

        for subtotal in subtotals {
            for bps in tax_rates {
                for include_tax in [true, false] {
                    for plan in &plans {
                        let b = engine.price(Money::from_cents(subtotal), Rate::from_bps(bps), include_tax, plan);
                        assert!(b.is_balanced(), "unbalanced: {:?} for {:?}", b, plan);
                    }
                }
            }
        }
    }

    #[test]
    fn test_pricing_is_byte_identical() {
        let terms = CheckoutTerms::default();
        let plan = PaymentPlan::Credit { duration_months: 12 };
        let first = PricingEngine::new(&terms).price(Money::from_cents(123_457), Rate::from_bps(825), true, &plan);
        let second = PricingEngine::new(&terms).price(Money::from_cents(123_457), Rate::from_bps(825), true, &plan);

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_reprice_uses_recorded_rates() {
        let terms = CheckoutTerms::default();
        let items = vec![crate::types::LineItem::new("RICE-25KG", 50_000, 2)];
        let plan = PaymentPlan::Credit { duration_months: 6 };
        let breakdown = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), true, &plan);

        let mut tx = Transaction {
            id: "t1".to_string(),
            receipt_number: "20260301-00000000".to_string(),
            customer_id: Some("c1".to_string()),
            items,
            plan,
            breakdown,
            terms_accepted: true,
            status: TransactionStatus::Committed,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        };
        assert_eq!(tx.reprice().unwrap(), breakdown);
        assert!(tx.has_consistent_totals());

        tx.breakdown.amount_deferred_cents -= 1;
        assert!(!tx.has_consistent_totals());
    }
}
