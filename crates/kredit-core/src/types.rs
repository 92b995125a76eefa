//! # Domain Types
//!
//! Core domain types used throughout Kredit POS checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │    LineItem     │   │   PaymentPlan    │   │ CustomerCredit   │     │
//! │  │  ─────────────  │   │  ──────────────  │   │     State        │     │
//! │  │  product_id     │   │  Full            │   │  ──────────────  │     │
//! │  │  unit_price     │   │  Partial         │   │  credit_limit    │     │
//! │  │  quantity       │   │  Credit          │   │  outstanding     │     │
//! │  └─────────────────┘   └──────────────────┘   └──────────────────┘     │
//! │           │                     │                       │               │
//! │           └─────────────────────┼───────────────────────┘               │
//! │                                 ▼                                       │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │  Transaction (immutable, status = Committed)                  │     │
//! │  │  id • receipt_number • items • plan • PriceBreakdown          │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A transaction has a `id` (UUID v4, used for relations) and a
//! `receipt_number` (human-readable, printed on receipts).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::{Money, Rate};

// =============================================================================
// Line Item
// =============================================================================

/// A line in the cart snapshot handed to the engine.
///
/// The unit price is frozen by the catalog at the time the item was added;
/// the engine never looks prices up itself.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Product reference (catalog id or SKU).
    pub product_id: String,

    /// Unit price in minor currency units.
    pub unit_price_cents: i64,

    /// Quantity sold (positive).
    pub quantity: i64,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(product_id: impl Into<String>, unit_price_cents: i64, quantity: i64) -> Self {
        LineItem {
            product_id: product_id.into(),
            unit_price_cents,
            quantity,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line subtotal (unit price × quantity), or `None` on overflow.
    #[inline]
    pub fn line_subtotal(&self) -> Option<Money> {
        self.unit_price().checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Settlement Method
// =============================================================================

/// How the collected-now part of a sale is settled.
///
/// These are opaque labels: no payment is processed by the engine.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    Cash,
    Card,
    Mobile,
    Bank,
}

impl SettlementMethod {
    /// Returns the stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMethod::Cash => "cash",
            SettlementMethod::Card => "card",
            SettlementMethod::Mobile => "mobile",
            SettlementMethod::Bank => "bank",
        }
    }
}

impl fmt::Display for SettlementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(SettlementMethod::Cash),
            "card" | "credit_card" | "debit_card" => Ok(SettlementMethod::Card),
            "mobile" | "mobile_money" => Ok(SettlementMethod::Mobile),
            "bank" | "bank_transfer" => Ok(SettlementMethod::Bank),
            other => Err(ValidationError::InvalidFormat {
                field: "settlement_method".to_string(),
                reason: format!("unknown method '{}', expected cash, card, mobile or bank", other),
            }),
        }
    }
}

// =============================================================================
// Payment Plan
// =============================================================================

/// The discriminant of a [`PaymentPlan`], used as a database column.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Full,
    Partial,
    Credit,
}

/// The payment plan chosen at checkout.
///
/// ## Plans
/// ```text
/// ┌──────────┬──────────────────────┬─────────────────────────────────────┐
/// │ Plan     │ Collected now        │ Deferred to customer balance        │
/// ├──────────┼──────────────────────┼─────────────────────────────────────┤
/// │ Full     │ base total           │ nothing                             │
/// │ Partial  │ pct% of base total   │ remainder, interest-free, due date  │
/// │ Credit   │ nothing              │ base total incl. duration interest  │
/// └──────────┴──────────────────────┴─────────────────────────────────────┘
/// ```
///
/// Fields are kept as the caller submitted them (percentage as a plain
/// integer, optional due date, raw month count) so that the plan validator
/// can report every problem instead of failing at deserialization.
/// The credit interest rate is not part of the plan: it is looked up from
/// [`CheckoutTerms`](crate::terms::CheckoutTerms) and recorded on the
/// [`PriceBreakdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentPlan {
    /// Pay everything now.
    Full { method: SettlementMethod },

    /// Pay a percentage now, defer the rest until `due_date`.
    Partial {
        method: SettlementMethod,
        percentage: u32,
        #[ts(as = "Option<String>")]
        due_date: Option<NaiveDate>,
    },

    /// Defer everything against the customer's credit limit.
    Credit { duration_months: u32 },
}

impl PaymentPlan {
    /// Returns the plan discriminant.
    pub fn kind(&self) -> PlanKind {
        match self {
            PaymentPlan::Full { .. } => PlanKind::Full,
            PaymentPlan::Partial { .. } => PlanKind::Partial,
            PaymentPlan::Credit { .. } => PlanKind::Credit,
        }
    }

    /// Settlement method of the collected-now part, if any is collected.
    pub fn settlement_method(&self) -> Option<SettlementMethod> {
        match self {
            PaymentPlan::Full { method } | PaymentPlan::Partial { method, .. } => Some(*method),
            PaymentPlan::Credit { .. } => None,
        }
    }

    /// Partial percentage, for partial plans.
    pub fn percentage(&self) -> Option<u32> {
        match self {
            PaymentPlan::Partial { percentage, .. } => Some(*percentage),
            _ => None,
        }
    }

    /// Due date of the deferred remainder, for partial plans.
    pub fn due_date(&self) -> Option<NaiveDate> {
        match self {
            PaymentPlan::Partial { due_date, .. } => *due_date,
            _ => None,
        }
    }

    /// Credit duration in months, for credit plans.
    pub fn duration_months(&self) -> Option<u32> {
        match self {
            PaymentPlan::Credit { duration_months } => Some(*duration_months),
            _ => None,
        }
    }

    /// True for plans that create credit exposure (Partial, Credit).
    pub fn requires_customer(&self) -> bool {
        !matches!(self, PaymentPlan::Full { .. })
    }
}

// =============================================================================
// Customer Credit State
// =============================================================================

/// A customer's credit position, read fresh before every validation.
///
/// ## Invariant
/// `outstanding_balance_cents <= credit_limit_cents` after every commit.
/// Only the transaction ledger writes `outstanding_balance_cents`.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerCreditState {
    pub customer_id: String,

    /// Maximum outstanding balance permitted, minor units.
    pub credit_limit_cents: i64,

    /// Sum of unpaid deferred amounts, minor units.
    pub outstanding_balance_cents: i64,
}

impl CustomerCreditState {
    /// Creates a credit state snapshot.
    pub fn new(customer_id: impl Into<String>, credit_limit_cents: i64, outstanding_balance_cents: i64) -> Self {
        CustomerCreditState {
            customer_id: customer_id.into(),
            credit_limit_cents,
            outstanding_balance_cents,
        }
    }

    /// Remaining headroom under the limit (`limit - outstanding`).
    ///
    /// May be negative if the limit was lowered administratively below the
    /// current balance.
    #[inline]
    pub fn available_credit(&self) -> Money {
        Money::from_cents(self.credit_limit_cents) - Money::from_cents(self.outstanding_balance_cents)
    }

    /// Whether `amount` more debt fits under the limit.
    pub fn can_absorb(&self, amount: Money) -> bool {
        Money::from_cents(self.outstanding_balance_cents)
            .checked_add(amount)
            .map(|after| after.cents() <= self.credit_limit_cents)
            .unwrap_or(false)
    }
}

/// A customer record as stored by the customer store.
///
/// Customer CRUD lives outside the checkout engine; this is the slice of the
/// record the ledger reads and writes.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub credit_limit_cents: i64,
    pub outstanding_balance_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new customer with no outstanding balance.
    pub fn new(name: impl Into<String>, credit_limit_cents: i64) -> Self {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            credit_limit_cents,
            outstanding_balance_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the credit-relevant snapshot of this customer.
    pub fn credit_state(&self) -> CustomerCreditState {
        CustomerCreditState::new(
            self.id.clone(),
            self.credit_limit_cents,
            self.outstanding_balance_cents,
        )
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// The monetary breakdown of a checkout.
///
/// ## Identities
/// - `base_total = subtotal + tax + interest`
/// - `amount_due_now + amount_deferred = base_total` (exactly, no rounding leak)
///
/// The applied rates are recorded alongside the amounts so a stored
/// transaction can be re-priced for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub subtotal_cents: i64,
    /// Tax rate that was in force, in basis points.
    pub tax_rate_bps: u32,
    /// Whether tax was applied for this sale.
    pub tax_included: bool,
    pub tax_cents: i64,
    /// Interest rate looked up for the credit duration (0 for other plans).
    pub interest_rate_bps: u32,
    pub interest_cents: i64,
    pub base_total_cents: i64,
    pub amount_due_now_cents: i64,
    pub amount_deferred_cents: i64,
}

impl PriceBreakdown {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn interest(&self) -> Money {
        Money::from_cents(self.interest_cents)
    }

    #[inline]
    pub fn base_total(&self) -> Money {
        Money::from_cents(self.base_total_cents)
    }

    #[inline]
    pub fn amount_due_now(&self) -> Money {
        Money::from_cents(self.amount_due_now_cents)
    }

    #[inline]
    pub fn amount_deferred(&self) -> Money {
        Money::from_cents(self.amount_deferred_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> Rate {
        Rate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn interest_rate(&self) -> Rate {
        Rate::from_bps(self.interest_rate_bps)
    }

    /// Checks both breakdown identities.
    pub fn is_balanced(&self) -> bool {
        self.subtotal_cents + self.tax_cents + self.interest_cents == self.base_total_cents
            && self.amount_due_now_cents + self.amount_deferred_cents == self.base_total_cents
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// The status of a transaction.
///
/// The engine only ever produces committed transactions; rejected attempts
/// leave no record at all.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Committed,
}

/// A committed checkout.
///
/// Created exactly once by the transaction ledger, never mutated afterwards.
/// Corrections (e.g. payment received) are separate records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    /// Unique identifier (UUID v4), never reused.
    pub id: String,
    /// Human-readable receipt number: `YYYYMMDD-XXXXXXXX`.
    pub receipt_number: String,
    /// Customer the sale is attributed to (None for walk-in).
    pub customer_id: Option<String>,
    /// Line item snapshot, in cart order.
    pub items: Vec<LineItem>,
    /// Payment plan snapshot.
    pub plan: PaymentPlan,
    pub breakdown: PriceBreakdown,
    pub terms_accepted: bool,
    pub status: TransactionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Builds a receipt number from the creation date and the transaction id.
///
/// ## Format
/// - `YYYYMMDD`: creation date (UTC)
/// - `XXXXXXXX`: first 8 hex digits of the UUID, upper-case
///
/// ## Example
/// `20260301-9F1C27AB`
pub fn receipt_number_for(id: &Uuid, created_at: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("{}-{}", created_at.format("%Y%m%d"), &simple[..8])
}

// =============================================================================
// Ledger Events (Outbox)
// =============================================================================

/// Event type written when a commit adjusts a customer's balance.
pub const BALANCE_ADJUSTED: &str = "BALANCE_ADJUSTED";

/// Payload of a [`BALANCE_ADJUSTED`] event.
///
/// Consumed by the customer-ledger view to refresh the displayed balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceAdjusted {
    pub customer_id: String,
    pub transaction_id: String,
    pub amount_deferred_cents: i64,
    pub outstanding_balance_cents: i64,
    pub credit_limit_cents: i64,
}

/// An entry in the ledger event outbox.
///
/// Written in the same database transaction as the committed sale, so an
/// event exists if and only if its balance adjustment does.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEvent {
    pub id: String,
    /// Event type, e.g. [`BALANCE_ADJUSTED`].
    pub event_type: String,
    pub customer_id: String,
    pub transaction_id: String,
    /// Event body as JSON.
    pub payload: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// When a consumer acknowledged the event.
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
