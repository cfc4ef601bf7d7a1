//! Database models for user profiles.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subscription plan tier. Stored as text in `user_profiles.plan_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Starter,
    Creator,
    Pro,
    Studio,
}

impl PlanType {
    /// Parse a plan name, falling back to `Free` for anything unrecognised.
    /// Charge metadata comes from an external system and is not trusted to
    /// carry valid plan names.
    pub fn parse_or_default(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "starter" => PlanType::Starter,
            "creator" => PlanType::Creator,
            "pro" => PlanType::Pro,
            "studio" => PlanType::Studio,
            _ => PlanType::Free,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfileDBResponse {
    pub id: UserId,
    pub email: Option<String>,
    pub credits: i32,
    pub plan_type: PlanType,
    pub subscription_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserProfileCreateDBRequest {
    pub email: Option<String>,
    pub credits: i32,
    pub plan_type: PlanType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parse_known_names() {
        assert_eq!(PlanType::parse_or_default("pro"), PlanType::Pro);
        assert_eq!(PlanType::parse_or_default("Studio"), PlanType::Studio);
        assert_eq!(PlanType::parse_or_default("free"), PlanType::Free);
    }

    #[test]
    fn test_plan_parse_unknown_defaults_to_free() {
        assert_eq!(PlanType::parse_or_default("enterprise"), PlanType::Free);
        assert_eq!(PlanType::parse_or_default(""), PlanType::Free);
    }
}
