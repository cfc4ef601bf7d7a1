//! API models for credit balances and ledger history.

use crate::db::models::{
    credits::{CreditTransactionDBResponse, CreditTransactionType},
    profiles::{PlanType, UserProfileDBResponse},
};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditBalanceResponse {
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub credits: i32,
    pub plan_type: PlanType,
    pub subscription_status: String,
}

impl From<UserProfileDBResponse> for CreditBalanceResponse {
    fn from(profile: UserProfileDBResponse) -> Self {
        Self {
            user_id: profile.id,
            credits: profile.credits,
            plan_type: profile.plan_type,
            subscription_status: profile.subscription_status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditTransactionResponse {
    pub id: i64,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub transaction_type: CreditTransactionType,
    pub amount: i32,
    pub description: Option<String>,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransactionDBResponse> for CreditTransactionResponse {
    fn from(tx: CreditTransactionDBResponse) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            transaction_type: tx.transaction_type,
            amount: tx.amount,
            description: tx.description,
            source_id: tx.source_id,
            created_at: tx.created_at,
        }
    }
}

/// Default number of transactions to return per page.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum number of transactions that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Pagination parameters for the transaction list. Values are clamped
/// through the accessors so out-of-range input never reaches the database.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TransactionListQuery {
    /// Number of transactions to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    pub skip: Option<i64>,

    /// Maximum number of transactions to return (default: 50, max: 100)
    #[param(default = 50, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl TransactionListQuery {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<CreditTransactionResponse>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = TransactionListQuery::default();
        assert_eq!(query.skip(), 0);
        assert_eq!(query.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_pagination_clamps_out_of_range_values() {
        let query = TransactionListQuery {
            skip: Some(-5),
            limit: Some(-1),
        };
        assert_eq!(query.skip(), 0);
        assert_eq!(query.limit(), 1);

        let query = TransactionListQuery {
            skip: Some(10),
            limit: Some(10_000),
        };
        assert_eq!(query.skip(), 10);
        assert_eq!(query.limit(), MAX_LIMIT);
    }
}
