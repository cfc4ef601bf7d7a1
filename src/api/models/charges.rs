//! API models for charge creation.

use crate::types::UserId;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

/// Request to start a credit purchase. The amount must match one of the
/// configured credit packs exactly; the pack determines the credits granted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChargeCreateRequest {
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    /// USD amount as a decimal string, e.g. "5.00"
    #[schema(value_type = String)]
    pub amount: Decimal,
}
