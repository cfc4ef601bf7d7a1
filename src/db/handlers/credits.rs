use crate::db::{
    errors::{DbError, Result},
    models::credits::{CreditPurchaseDBRequest, CreditTransactionDBResponse, CreditTransactionType, PurchaseOutcome},
};
use crate::types::UserId;
use sqlx::{Connection, PgConnection};

pub struct Credits<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Credits<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Apply a confirmed purchase: append the ledger row and increment the
    /// profile balance in one transaction.
    ///
    /// The ledger insert goes first with `ON CONFLICT (source_id) DO NOTHING`;
    /// when the charge code was already recorded the insert returns no row and
    /// the balance is left untouched, so redelivered webhooks credit at most
    /// once. The increment itself is a single `credits = credits + $1` update,
    /// never a read-modify-write from the application.
    pub async fn record_purchase(&mut self, request: &CreditPurchaseDBRequest) -> Result<PurchaseOutcome> {
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_as::<_, CreditTransactionDBResponse>(
            r#"
            INSERT INTO credit_transactions (user_id, transaction_type, amount, description, source_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_id) DO NOTHING
            RETURNING id, user_id, transaction_type, amount, description, source_id, metadata, created_at
            "#,
        )
        .bind(request.user_id)
        .bind(CreditTransactionType::Purchase)
        .bind(request.amount)
        .bind(&request.description)
        .bind(&request.source_id)
        .bind(&request.metadata)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(transaction) = inserted else {
            // Duplicate delivery; dropping tx rolls back the no-op
            return Ok(PurchaseOutcome::AlreadyProcessed);
        };

        let result = if let Some(plan) = request.plan {
            sqlx::query(
                r#"
                UPDATE user_profiles
                SET credits = credits + $1,
                    plan_type = $2,
                    subscription_status = 'active',
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(request.amount)
            .bind(plan)
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE user_profiles
                SET credits = credits + $1, updated_at = NOW()
                WHERE id = $2
                "#,
            )
            .bind(request.amount)
            .bind(request.user_id)
            .execute(&mut *tx)
            .await?
        };

        if result.rows_affected() == 0 {
            // No profile to credit; roll back the ledger row as well
            return Err(DbError::NotFound);
        }

        tx.commit().await?;

        Ok(PurchaseOutcome::Applied(transaction))
    }

    /// Append a grant entry (promotions, support adjustments) and increment
    /// the balance. Same idempotency contract as purchases.
    pub async fn record_grant(&mut self, user_id: UserId, amount: i32, source_id: &str, description: Option<&str>) -> Result<PurchaseOutcome> {
        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query_as::<_, CreditTransactionDBResponse>(
            r#"
            INSERT INTO credit_transactions (user_id, transaction_type, amount, description, source_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_id) DO NOTHING
            RETURNING id, user_id, transaction_type, amount, description, source_id, metadata, created_at
            "#,
        )
        .bind(user_id)
        .bind(CreditTransactionType::Grant)
        .bind(amount)
        .bind(description)
        .bind(source_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(transaction) = inserted else {
            return Ok(PurchaseOutcome::AlreadyProcessed);
        };

        let result = sqlx::query("UPDATE user_profiles SET credits = credits + $1, updated_at = NOW() WHERE id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;

        Ok(PurchaseOutcome::Applied(transaction))
    }

    /// List transactions for a user with pagination, newest first
    pub async fn list_user_transactions(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CreditTransactionDBResponse>> {
        let transactions = sqlx::query_as::<_, CreditTransactionDBResponse>(
            r#"
            SELECT id, user_id, transaction_type, amount, description, source_id, metadata, created_at
            FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(transactions)
    }

    /// Count ledger rows for a user
    pub async fn count_user_transactions(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
