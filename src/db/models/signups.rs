//! Database models for signup attempt logging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignupAttemptDBResponse {
    pub id: i64,
    pub ip_address: String,
    pub fingerprint: Option<String>,
    pub email: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SignupAttemptCreateDBRequest {
    pub ip_address: String,
    pub fingerprint: Option<String>,
    pub email: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
}
