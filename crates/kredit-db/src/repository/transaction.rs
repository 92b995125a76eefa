//! # Transaction Repository
//!
//! Queries over committed transactions. Transactions are written only by
//! [`TransactionLedger`](crate::ledger::TransactionLedger) and never updated,
//! so this repository is read-only.
//!
//! ## Plan Storage
//! ```text
//! PaymentPlan                     transactions columns
//! ─────────────────────────────   ──────────────────────────────────────────
//! Full    { method }          →   plan_kind='full',    settlement_method
//! Partial { method, pct, due }→   plan_kind='partial', settlement_method,
//!                                 partial_percentage, due_date
//! Credit  { duration_months } →   plan_kind='credit',  credit_duration_months
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kredit_core::{
    LineItem, PaymentPlan, PlanKind, PriceBreakdown, SettlementMethod, Transaction, TransactionStatus,
};

/// Columns selected for a transaction row, in [`TransactionRow`] order.
const TRANSACTION_COLUMNS: &str = r#"
    id, receipt_number, customer_id, status,
    plan_kind, settlement_method, partial_percentage, due_date, credit_duration_months,
    subtotal_cents, tax_rate_bps, tax_included, tax_cents,
    interest_rate_bps, interest_cents, base_total_cents,
    amount_due_now_cents, amount_deferred_cents,
    terms_accepted, created_at
"#;

/// A `transactions` row, before its items are attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    pub id: String,
    pub receipt_number: String,
    pub customer_id: Option<String>,
    pub status: TransactionStatus,
    pub plan_kind: PlanKind,
    pub settlement_method: Option<SettlementMethod>,
    pub partial_percentage: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub credit_duration_months: Option<i64>,
    pub subtotal_cents: i64,
    pub tax_rate_bps: i64,
    pub tax_included: bool,
    pub tax_cents: i64,
    pub interest_rate_bps: i64,
    pub interest_cents: i64,
    pub base_total_cents: i64,
    pub amount_due_now_cents: i64,
    pub amount_deferred_cents: i64,
    pub terms_accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn to_u32(&self, column: &str, value: i64) -> DbResult<u32> {
        u32::try_from(value).map_err(|_| DbError::corrupt_row("transactions", &self.id, format!("{} = {}", column, value)))
    }

    fn required<T>(&self, column: &str, value: Option<T>) -> DbResult<T> {
        value.ok_or_else(|| DbError::corrupt_row("transactions", &self.id, format!("{} is NULL", column)))
    }

    fn plan(&self) -> DbResult<PaymentPlan> {
        Ok(match self.plan_kind {
            PlanKind::Full => PaymentPlan::Full {
                method: self.required("settlement_method", self.settlement_method)?,
            },
            PlanKind::Partial => PaymentPlan::Partial {
                method: self.required("settlement_method", self.settlement_method)?,
                percentage: self.to_u32(
                    "partial_percentage",
                    self.required("partial_percentage", self.partial_percentage)?,
                )?,
                due_date: self.due_date,
            },
            PlanKind::Credit => PaymentPlan::Credit {
                duration_months: self.to_u32(
                    "credit_duration_months",
                    self.required("credit_duration_months", self.credit_duration_months)?,
                )?,
            },
        })
    }

    /// Rebuilds the domain transaction from this row and its items.
    pub(crate) fn into_transaction(self, items: Vec<LineItem>) -> DbResult<Transaction> {
        let plan = self.plan()?;
        let breakdown = PriceBreakdown {
            subtotal_cents: self.subtotal_cents,
            tax_rate_bps: self.to_u32("tax_rate_bps", self.tax_rate_bps)?,
            tax_included: self.tax_included,
            tax_cents: self.tax_cents,
            interest_rate_bps: self.to_u32("interest_rate_bps", self.interest_rate_bps)?,
            interest_cents: self.interest_cents,
            base_total_cents: self.base_total_cents,
            amount_due_now_cents: self.amount_due_now_cents,
            amount_deferred_cents: self.amount_deferred_cents,
        };

        Ok(Transaction {
            id: self.id,
            receipt_number: self.receipt_number,
            customer_id: self.customer_id,
            items,
            plan,
            breakdown,
            terms_accepted: self.terms_accepted,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

/// Repository for committed transaction queries.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction, with its items, by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE id = ?1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.get_items(&row.id).await?;
                Ok(Some(row.into_transaction(items)?))
            }
            None => Ok(None),
        }
    }

    /// Gets a transaction by its receipt number.
    pub async fn get_by_receipt_number(&self, receipt_number: &str) -> DbResult<Option<Transaction>> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM transactions WHERE receipt_number = ?1")
            .bind(receipt_number)
            .fetch_optional(&self.pool)
            .await?;

        match id {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Gets the line items of a transaction, in cart order.
    pub async fn get_items(&self, transaction_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT product_id, unit_price_cents, quantity
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists a customer's transactions, newest first.
    pub async fn list_for_customer(&self, customer_id: &str, limit: i64) -> DbResult<Vec<Transaction>> {
        debug!(customer_id = %customer_id, limit = limit, "Listing customer transactions");

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {} FROM transactions WHERE customer_id = ?1 ORDER BY created_at DESC, id LIMIT ?2",
            TRANSACTION_COLUMNS
        ))
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.get_items(&row.id).await?;
            transactions.push(row.into_transaction(items)?);
        }

        Ok(transactions)
    }

    /// Counts committed transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
