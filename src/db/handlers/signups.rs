use crate::db::{
    errors::Result,
    models::signups::{SignupAttemptCreateDBRequest, SignupAttemptDBResponse},
};
use sqlx::PgConnection;
use std::time::Duration;

pub struct Signups<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Signups<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Append a signup attempt row
    pub async fn log_attempt(&mut self, request: &SignupAttemptCreateDBRequest) -> Result<SignupAttemptDBResponse> {
        let attempt = sqlx::query_as::<_, SignupAttemptDBResponse>(
            r#"
            INSERT INTO signup_attempts (ip_address, fingerprint, email, user_agent, success)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, ip_address, fingerprint, email, user_agent, success, created_at
            "#,
        )
        .bind(&request.ip_address)
        .bind(&request.fingerprint)
        .bind(&request.email)
        .bind(&request.user_agent)
        .bind(request.success)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(attempt)
    }

    /// Ask the database-side rate policy whether a signup from this IP or
    /// fingerprint is still within bounds
    pub async fn check_rate(
        &mut self,
        ip_address: &str,
        fingerprint: Option<&str>,
        window: Duration,
        max_attempts: i32,
    ) -> Result<bool> {
        let allowed: bool = sqlx::query_scalar("SELECT check_signup_rate($1, $2, make_interval(secs => $3), $4)")
            .bind(ip_address)
            .bind(fingerprint)
            .bind(window.as_secs_f64())
            .bind(max_attempts)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(allowed)
    }
}
