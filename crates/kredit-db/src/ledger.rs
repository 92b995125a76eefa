//! # Transaction Ledger
//!
//! Commits accepted checkouts. This is the only code that writes
//! `customers.outstanding_balance_cents`.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├─ deferred > 0?                                                     │
//! │   │     UPDATE customers                                               │
//! │   │        SET outstanding_balance_cents = outstanding + deferred      │
//! │   │      WHERE id = ?                                                  │
//! │   │        AND outstanding_balance_cents = <validated balance>   (CAS) │
//! │   │        AND outstanding + deferred <= credit_limit_cents            │
//! │   │     0 rows → ROLLBACK, StaleCreditState                            │
//! │   │                                                                     │
//! │   ├─ INSERT transactions                                               │
//! │   ├─ INSERT transaction_items (one per line, cart order)               │
//! │   ├─ deferred > 0? INSERT ledger_events (BALANCE_ADJUSTED)             │
//! │   │                                                                     │
//! │  COMMIT ← all of the above, or none of it                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The balance update runs first so a SQLite write lock is taken before any
//! row is inserted. Any error drops the open transaction, which rolls back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kredit_core::{
    receipt_number_for, AcceptedCheckout, BalanceAdjusted, CustomerCreditState, LineItem, Transaction,
    TransactionStatus, BALANCE_ADJUSTED,
};

/// Writes committed transactions and their balance adjustments.
#[derive(Debug, Clone)]
pub struct TransactionLedger {
    pool: SqlitePool,
}

impl TransactionLedger {
    /// Creates a new TransactionLedger.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionLedger { pool }
    }

    /// Commits an accepted checkout.
    ///
    /// Generates the transaction id and receipt number, then writes the
    /// transaction, its items, the balance adjustment and the ledger event
    /// atomically.
    ///
    /// ## Errors
    /// - `StaleCreditState` if the customer's balance is no longer the one
    ///   that was validated (another checkout committed first)
    /// - any other `DbError` for infrastructure failures
    ///
    /// On error nothing is written.
    pub async fn commit(
        &self,
        items: Vec<LineItem>,
        accepted: AcceptedCheckout,
        created_at: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        let uuid = Uuid::new_v4();
        let transaction = Transaction {
            id: uuid.to_string(),
            receipt_number: receipt_number_for(&uuid, created_at),
            customer_id: accepted.customer_id().map(str::to_string),
            items,
            plan: accepted.plan().clone(),
            breakdown: *accepted.breakdown(),
            terms_accepted: accepted.terms_accepted(),
            status: TransactionStatus::Committed,
            created_at,
        };

        self.persist(&transaction, accepted.customer()).await?;

        info!(
            id = %transaction.id,
            receipt_number = %transaction.receipt_number,
            customer_id = ?transaction.customer_id,
            plan = ?transaction.plan.kind(),
            base_total = transaction.breakdown.base_total_cents,
            deferred = transaction.breakdown.amount_deferred_cents,
            "Transaction committed"
        );

        Ok(transaction)
    }

    /// Writes `transaction` in one database transaction.
    async fn persist(&self, transaction: &Transaction, customer: Option<&CustomerCreditState>) -> DbResult<()> {
        let deferred = transaction.breakdown.amount_deferred_cents;
        let mut db_tx = self.pool.begin().await?;

        let adjustment = if deferred > 0 {
            let customer = customer.ok_or_else(|| {
                DbError::Internal(format!(
                    "transaction {} defers {} without a customer",
                    transaction.id, deferred
                ))
            })?;
            let (outstanding_after, credit_limit) =
                adjust_balance(&mut db_tx, customer, deferred, transaction.created_at).await?;
            Some(BalanceAdjusted {
                customer_id: customer.customer_id.clone(),
                transaction_id: transaction.id.clone(),
                amount_deferred_cents: deferred,
                outstanding_balance_cents: outstanding_after,
                credit_limit_cents: credit_limit,
            })
        } else {
            None
        };

        insert_transaction(&mut db_tx, transaction).await?;

        for (line_no, item) in transaction.items.iter().enumerate() {
            insert_item(&mut db_tx, &transaction.id, line_no as i64, item).await?;
        }

        if let Some(payload) = &adjustment {
            insert_event(&mut db_tx, payload, transaction.created_at).await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }
}

// =============================================================================
// Statements
// =============================================================================

type DbTransaction<'c> = sqlx::Transaction<'c, Sqlite>;

/// Compare-and-swap balance increment. Returns `(outstanding_after, limit)`.
async fn adjust_balance(
    db_tx: &mut DbTransaction<'_>,
    customer: &CustomerCreditState,
    deferred: i64,
    at: DateTime<Utc>,
) -> DbResult<(i64, i64)> {
    let updated: Option<(i64, i64)> = sqlx::query_as(
        r#"
        UPDATE customers SET
            outstanding_balance_cents = outstanding_balance_cents + ?1,
            updated_at = ?2
        WHERE id = ?3
          AND outstanding_balance_cents = ?4
          AND outstanding_balance_cents + ?1 <= credit_limit_cents
        RETURNING outstanding_balance_cents, credit_limit_cents
        "#,
    )
    .bind(deferred)
    .bind(at)
    .bind(&customer.customer_id)
    .bind(customer.outstanding_balance_cents)
    .fetch_optional(&mut **db_tx)
    .await?;

    match updated {
        Some(after) => {
            debug!(
                customer_id = %customer.customer_id,
                before = customer.outstanding_balance_cents,
                after = after.0,
                "Outstanding balance adjusted"
            );
            Ok(after)
        }
        None => {
            warn!(
                customer_id = %customer.customer_id,
                validated_balance = customer.outstanding_balance_cents,
                deferred = deferred,
                "Credit state changed since validation, commit refused"
            );
            Err(DbError::StaleCreditState {
                customer_id: customer.customer_id.clone(),
            })
        }
    }
}

async fn insert_transaction(db_tx: &mut DbTransaction<'_>, transaction: &Transaction) -> DbResult<()> {
    let b = &transaction.breakdown;
    let plan = &transaction.plan;

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, receipt_number, customer_id, status,
            plan_kind, settlement_method, partial_percentage, due_date, credit_duration_months,
            subtotal_cents, tax_rate_bps, tax_included, tax_cents,
            interest_rate_bps, interest_cents, base_total_cents,
            amount_due_now_cents, amount_deferred_cents,
            terms_accepted, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18,
            ?19, ?20
        )
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.receipt_number)
    .bind(&transaction.customer_id)
    .bind(transaction.status)
    .bind(plan.kind())
    .bind(plan.settlement_method())
    .bind(plan.percentage().map(i64::from))
    .bind(plan.due_date())
    .bind(plan.duration_months().map(i64::from))
    .bind(b.subtotal_cents)
    .bind(i64::from(b.tax_rate_bps))
    .bind(b.tax_included)
    .bind(b.tax_cents)
    .bind(i64::from(b.interest_rate_bps))
    .bind(b.interest_cents)
    .bind(b.base_total_cents)
    .bind(b.amount_due_now_cents)
    .bind(b.amount_deferred_cents)
    .bind(transaction.terms_accepted)
    .bind(transaction.created_at)
    .execute(&mut **db_tx)
    .await?;

    Ok(())
}

async fn insert_item(db_tx: &mut DbTransaction<'_>, transaction_id: &str, line_no: i64, item: &LineItem) -> DbResult<()> {
    let line_subtotal = item
        .line_subtotal()
        .ok_or_else(|| DbError::Internal(format!("line {} subtotal overflows", line_no)))?;

    sqlx::query(
        r#"
        INSERT INTO transaction_items (
            id, transaction_id, line_no, product_id,
            unit_price_cents, quantity, line_subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(transaction_id)
    .bind(line_no)
    .bind(&item.product_id)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(line_subtotal.cents())
    .execute(&mut **db_tx)
    .await?;

    Ok(())
}

async fn insert_event(db_tx: &mut DbTransaction<'_>, payload: &BalanceAdjusted, at: DateTime<Utc>) -> DbResult<()> {
    let body = serde_json::to_string(payload)?;

    sqlx::query(
        r#"
        INSERT INTO ledger_events (
            id, event_type, customer_id, transaction_id, payload, created_at, delivered_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(BALANCE_ADJUSTED)
    .bind(&payload.customer_id)
    .bind(&payload.transaction_id)
    .bind(body)
    .bind(at)
    .execute(&mut **db_tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, NaiveDate, TimeZone};
    use kredit_core::{
        CheckoutTerms, Customer, Money, PaymentPlan, PlanValidator, PricingEngine, Rate, SettlementMethod,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn cart() -> Vec<LineItem> {
        vec![LineItem::new("RICE-25KG", 45_000, 2), LineItem::new("OIL-5L", 10_000, 1)]
    }

    async fn setup(outstanding: i64) -> (Database, Customer) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut customer = Customer::new("Amina Traders", 500_000);
        customer.outstanding_balance_cents = outstanding;
        db.customers().insert(&customer).await.unwrap();
        (db, customer)
    }

    fn accept(plan: PaymentPlan, state: Option<CustomerCreditState>) -> AcceptedCheckout {
        let terms = CheckoutTerms::default();
        let breakdown = PricingEngine::new(&terms).price(Money::from_cents(100_000), Rate::from_bps(1800), true, &plan);
        PlanValidator::new(&terms)
            .validate(breakdown, plan, state, true, today())
            .unwrap()
    }

    #[tokio::test]
    async fn test_partial_commit_adjusts_balance_and_writes_event() {
        let (db, customer) = setup(0).await;
        let state = db.customers().get_credit_state(&customer.id).await.unwrap();
        let plan = PaymentPlan::Partial {
            method: SettlementMethod::Cash,
            percentage: 50,
            due_date: Some(today() + Duration::days(7)),
        };

        let tx = db.ledger().commit(cart(), accept(plan, state), now()).await.unwrap();
        assert_eq!(tx.breakdown.amount_deferred_cents, 59_000);
        assert!(tx.receipt_number.starts_with("20260301-"));

        let after = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.outstanding_balance_cents, 59_000);

        let events = db.ledger_events().get_pending(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, BALANCE_ADJUSTED);
        let payload: BalanceAdjusted = serde_json::from_str(&events[0].payload).unwrap();
        assert_eq!(payload.transaction_id, tx.id);
        assert_eq!(payload.outstanding_balance_cents, 59_000);
        assert_eq!(payload.credit_limit_cents, 500_000);

        db.ledger_events().mark_delivered(&events[0].id).await.unwrap();
        assert_eq!(db.ledger_events().count_pending().await.unwrap(), 0);
        assert_eq!(db.ledger_events().list_for_customer(&customer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stored_transaction_round_trips() {
        let (db, customer) = setup(0).await;
        let state = db.customers().get_credit_state(&customer.id).await.unwrap();

        let committed = db
            .ledger()
            .commit(cart(), accept(PaymentPlan::Credit { duration_months: 6 }, state), now())
            .await
            .unwrap();

        let stored = db.transactions().get_by_id(&committed.id).await.unwrap().unwrap();
        assert_eq!(stored, committed);
        assert!(stored.has_consistent_totals());

        let by_receipt = db
            .transactions()
            .get_by_receipt_number(&committed.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_receipt.id, committed.id);

        let listed = db.transactions().list_for_customer(&customer.id, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].items, cart());
    }

    #[tokio::test]
    async fn test_walk_in_full_payment_touches_no_balance() {
        let (db, customer) = setup(0).await;
        let plan = PaymentPlan::Full {
            method: SettlementMethod::Card,
        };

        let tx = db.ledger().commit(cart(), accept(plan, None), now()).await.unwrap();
        assert_eq!(tx.customer_id, None);
        assert_eq!(tx.breakdown.amount_deferred_cents, 0);

        let state = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(state.outstanding_balance_cents, 0);
        assert_eq!(db.ledger_events().count_pending().await.unwrap(), 0);
        assert_eq!(db.transactions().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_refused() {
        let (db, customer) = setup(0).await;
        let snapshot = db.customers().get_credit_state(&customer.id).await.unwrap();
        let plan = PaymentPlan::Credit { duration_months: 6 };

        let first = accept(plan.clone(), snapshot.clone());
        let second = accept(plan, snapshot);

        db.ledger().commit(cart(), first, now()).await.unwrap();
        let err = db.ledger().commit(cart(), second, now()).await.unwrap_err();
        assert!(matches!(err, DbError::StaleCreditState { .. }));

        let state = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(state.outstanding_balance_cents, 127_440);
        assert_eq!(db.transactions().count().await.unwrap(), 1);
        assert_eq!(db.ledger_events().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_balance() {
        let (db, customer) = setup(0).await;
        let state = db.customers().get_credit_state(&customer.id).await.unwrap();
        let ledger = db.ledger();

        let committed = ledger
            .commit(cart(), accept(PaymentPlan::Credit { duration_months: 3 }, state), now())
            .await
            .unwrap();

        // Same id again, against the fresh balance: the CAS passes, the
        // transaction insert fails on the primary key.
        let fresh = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        let err = ledger.persist(&committed, Some(&fresh)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let after = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.outstanding_balance_cents, fresh.outstanding_balance_cents);
        assert_eq!(db.transactions().count().await.unwrap(), 1);
        assert_eq!(db.ledger_events().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_limit_guard_in_update() {
        // Validated against a snapshot that claims plenty of headroom, but the
        // stored limit is lower: the update's own limit check refuses.
        let (db, customer) = setup(450_000).await;
        let lying_snapshot = CustomerCreditState::new(customer.id.clone(), 1_000_000, 450_000);

        let err = db
            .ledger()
            .commit(cart(), accept(PaymentPlan::Credit { duration_months: 6 }, Some(lying_snapshot)), now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleCreditState { .. }));

        let state = db.customers().get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(state.outstanding_balance_cents, 450_000);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }
}
