//! # Ledger Event Repository
//!
//! Consumer side of the ledger event outbox.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  TransactionLedger::commit                                             │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  1. UPDATE customers SET outstanding_balance_cents += deferred  │   │
//! │  │  2. INSERT INTO transactions / transaction_items                │   │
//! │  │  3. INSERT INTO ledger_events ('BALANCE_ADJUSTED', payload)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Customer-ledger view (THIS REPOSITORY)                                │
//! │  1. get_pending(limit)  → refresh displayed balances                   │
//! │  2. mark_delivered(id)                                                 │
//! │                                                                         │
//! │  An event exists if and only if its balance adjustment committed.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kredit_core::LedgerEvent;

/// Repository for ledger event outbox operations.
#[derive(Debug, Clone)]
pub struct LedgerEventRepository {
    pool: SqlitePool,
}

impl LedgerEventRepository {
    /// Creates a new LedgerEventRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerEventRepository { pool }
    }

    /// Gets undelivered events, oldest first.
    pub async fn get_pending(&self, limit: i64) -> DbResult<Vec<LedgerEvent>> {
        let events = sqlx::query_as::<_, LedgerEvent>(
            r#"
            SELECT id, event_type, customer_id, transaction_id, payload,
                   created_at, delivered_at
            FROM ledger_events
            WHERE delivered_at IS NULL
            ORDER BY created_at, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = events.len(), "Fetched pending ledger events");
        Ok(events)
    }

    /// Gets every event recorded for a customer, oldest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<LedgerEvent>> {
        let events = sqlx::query_as::<_, LedgerEvent>(
            r#"
            SELECT id, event_type, customer_id, transaction_id, payload,
                   created_at, delivered_at
            FROM ledger_events
            WHERE customer_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Marks an event as delivered.
    pub async fn mark_delivered(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_events SET delivered_at = ?2
            WHERE id = ?1 AND delivered_at IS NULL
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending ledger event", id));
        }

        debug!(id = %id, "Ledger event delivered");
        Ok(())
    }

    /// Counts undelivered events.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ledger_events WHERE delivered_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    use super::*;

    #[tokio::test]
    async fn test_mark_unknown_event_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.ledger_events();

        assert_eq!(repo.count_pending().await.unwrap(), 0);
        assert!(repo.get_pending(10).await.unwrap().is_empty());
        assert!(matches!(
            repo.mark_delivered("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
