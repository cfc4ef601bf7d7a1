use crate::db::errors::Result;
use sqlx::PgConnection;

/// Key/value configuration stored in the database. Holds secrets that are
/// rotated without redeploying, such as the image-generation API key.
pub struct SystemConfig<'c> {
    db: &'c mut PgConnection,
}

impl<'c> SystemConfig<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM system_config WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(value)
    }

    pub async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO system_config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }
}
