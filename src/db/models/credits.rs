//! Database models for the credit ledger.

use crate::db::models::profiles::PlanType;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a ledger entry came from. Stored as text in
/// `credit_transactions.transaction_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionType {
    /// Credits bought through the payment provider
    Purchase,
    /// Credits granted out of band (promotions, support)
    Grant,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditTransactionDBResponse {
    pub id: i64,
    pub user_id: UserId,
    pub transaction_type: CreditTransactionType,
    pub amount: i32,
    pub description: Option<String>,
    pub source_id: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A confirmed purchase to apply: ledger row plus balance increment.
#[derive(Debug, Clone)]
pub struct CreditPurchaseDBRequest {
    pub user_id: UserId,
    /// Credits to add; must be positive
    pub amount: i32,
    /// Provider charge code, unique per charge
    pub source_id: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Plan to move the profile onto, when the charge carries one
    pub plan: Option<PlanType>,
}

/// Outcome of applying a purchase.
#[derive(Debug)]
pub enum PurchaseOutcome {
    /// Ledger row inserted and balance incremented
    Applied(CreditTransactionDBResponse),
    /// A ledger row with this source_id already exists; nothing changed
    AlreadyProcessed,
}
