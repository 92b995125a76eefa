//! # Customer Repository
//!
//! Customer records as far as checkout needs them: creation (for seeding and
//! tests) and the credit state read immediately before validation.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kredit_core::{Customer, CustomerCreditState};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the id is taken
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, limit = customer.credit_limit_cents, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, credit_limit_cents, outstanding_balance_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.credit_limit_cents)
        .bind(customer.outstanding_balance_cents)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, customer.id.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, credit_limit_cents, outstanding_balance_cents,
                   created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Reads the current credit state of a customer.
    ///
    /// Always hits the database. Callers must not cache the result across
    /// checkouts: the ledger rejects commits against a stale balance.
    pub async fn get_credit_state(&self, id: &str) -> DbResult<Option<CustomerCreditState>> {
        debug!(customer_id = %id, "Reading credit state");

        let state = sqlx::query_as::<_, CustomerCreditState>(
            r#"
            SELECT id AS customer_id, credit_limit_cents, outstanding_balance_cents
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Counts customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
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
    async fn test_insert_and_read_credit_state() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = Customer::new("Amina Traders", 500_000);
        repo.insert(&customer).await.unwrap();

        let stored = repo.get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Amina Traders");
        assert_eq!(stored.outstanding_balance_cents, 0);

        let state = repo.get_credit_state(&customer.id).await.unwrap().unwrap();
        assert_eq!(state, CustomerCreditState::new(customer.id.clone(), 500_000, 0));

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.customers().get_credit_state("nobody").await.unwrap().is_none());
        assert!(db.customers().get_by_id("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = Customer::new("Dup", 100);
        db.customers().insert(&customer).await.unwrap();

        let err = db.customers().insert(&customer).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == customer.id));
    }

    #[tokio::test]
    async fn test_negative_balance_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut customer = Customer::new("Negative", 100);
        customer.outstanding_balance_cents = -1;

        let err = db.customers().insert(&customer).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }
}
