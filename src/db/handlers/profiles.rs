use crate::db::{
    errors::Result,
    models::profiles::{UserProfileCreateDBRequest, UserProfileDBResponse},
};
use crate::types::UserId;
use sqlx::PgConnection;

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a new user profile
    pub async fn create(&mut self, request: &UserProfileCreateDBRequest) -> Result<UserProfileDBResponse> {
        let profile = sqlx::query_as::<_, UserProfileDBResponse>(
            r#"
            INSERT INTO user_profiles (email, credits, plan_type)
            VALUES ($1, $2, $3)
            RETURNING id, email, credits, plan_type, subscription_status, created_at, updated_at
            "#,
        )
        .bind(&request.email)
        .bind(request.credits)
        .bind(request.plan_type)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    /// Fetch a profile by id
    pub async fn get(&mut self, id: UserId) -> Result<Option<UserProfileDBResponse>> {
        let profile = sqlx::query_as::<_, UserProfileDBResponse>(
            r#"
            SELECT id, email, credits, plan_type, subscription_status, created_at, updated_at
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(profile)
    }
}
