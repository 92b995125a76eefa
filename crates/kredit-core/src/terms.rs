//! # Checkout Terms
//!
//! The business-configured constants that govern payment plans: the
//! partial-payment floor and ceiling, and the credit duration → interest
//! rate table.
//!
//! These live in one place and are injected into the pricing engine and the
//! plan validator, so every caller prices and validates against the same
//! numbers.
//!
//! ## Defaults
//! ```text
//! ┌──────────────────────────┬──────────────┐
//! │ Partial payment          │ 30% – 90%    │
//! ├──────────────────────────┼──────────────┤
//! │ Credit  3 months         │  5%          │
//! │ Credit  6 months         │  8%          │
//! │ Credit 12 months         │ 12%          │
//! │ Credit 24 months         │ 20%          │
//! └──────────────────────────┴──────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Rate;
use crate::validation::{validate_percent_bounds, validate_rate_bps, ValidationResult};

/// One row of the credit duration → interest rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreditPlanTerm {
    /// Plan duration in months.
    pub months: u32,
    /// Flat interest for the whole duration, in basis points.
    pub rate_bps: u32,
}

impl CreditPlanTerm {
    pub const fn new(months: u32, rate_bps: u32) -> Self {
        CreditPlanTerm { months, rate_bps }
    }

    #[inline]
    pub fn rate(&self) -> Rate {
        Rate::from_bps(self.rate_bps)
    }
}

/// Partial bounds and credit plans used for pricing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CheckoutTerms {
    /// Lowest percentage a partial plan may collect now (inclusive).
    pub partial_min_percent: u32,
    /// Highest percentage a partial plan may collect now (inclusive).
    pub partial_max_percent: u32,
    /// Offered credit durations, each bound to a fixed rate.
    pub credit_plans: Vec<CreditPlanTerm>,
}

impl Default for CheckoutTerms {
    fn default() -> Self {
        CheckoutTerms {
            partial_min_percent: 30,
            partial_max_percent: 90,
            credit_plans: vec![
                CreditPlanTerm::new(3, 500),
                CreditPlanTerm::new(6, 800),
                CreditPlanTerm::new(12, 1200),
                CreditPlanTerm::new(24, 2000),
            ],
        }
    }
}

impl CheckoutTerms {
    /// Looks up the interest rate for a credit duration.
    ///
    /// Returns `None` for a duration that is not offered. Callers never
    /// supply their own rate.
    pub fn credit_rate(&self, months: u32) -> Option<Rate> {
        self.credit_plans
            .iter()
            .find(|plan| plan.months == months)
            .map(CreditPlanTerm::rate)
    }

    /// Offered durations, ascending.
    pub fn allowed_durations(&self) -> Vec<u32> {
        let mut months: Vec<u32> = self.credit_plans.iter().map(|p| p.months).collect();
        months.sort_unstable();
        months
    }

    /// Whether `percentage` is inside the partial bounds.
    #[inline]
    pub fn partial_in_range(&self, percentage: u32) -> bool {
        (self.partial_min_percent..=self.partial_max_percent).contains(&percentage)
    }

    /// Checks the terms are usable.
    ///
    /// ## Rules
    /// - partial bounds within 1–99 and `min <= max`
    /// - at least one credit plan
    /// - durations positive and unique
    /// - rates within 0–10000 bps
    pub fn validate(&self) -> ValidationResult<()> {
        validate_percent_bounds(self.partial_min_percent, self.partial_max_percent)?;

        if self.credit_plans.is_empty() {
            return Err(ValidationError::Required {
                field: "credit_plans".to_string(),
            });
        }

        let mut seen = Vec::with_capacity(self.credit_plans.len());
        for plan in &self.credit_plans {
            if plan.months == 0 {
                return Err(ValidationError::MustBePositive {
                    field: "credit_plans.months".to_string(),
                });
            }
            if seen.contains(&plan.months) {
                return Err(ValidationError::Duplicate {
                    field: "credit_plans.months".to_string(),
                    value: plan.months.to_string(),
                });
            }
            seen.push(plan.months);
            validate_rate_bps("credit_plans.rate_bps", plan.rate_bps)?;
        }

        Ok(())
    }
}
