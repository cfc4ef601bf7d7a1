//! Generation API key retrieval.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::generation::GenerationKeyResponse,
    db::{errors::DbError, handlers::SystemConfig},
    errors::{Error, Result},
};

/// Key under which the generation API key is stored in `system_config`
const GENERATION_KEY: &str = "generation_api_key";

/// Resolve the image-generation API key: environment-derived config first,
/// then the `system_config` table.
#[utoipa::path(
    get,
    path = "/generation-key",
    responses(
        (status = 200, description = "Resolved API key", body = GenerationKeyResponse),
        (status = 500, description = "No key configured in either source"),
    ),
    tag = "content"
)]
#[tracing::instrument(skip_all)]
pub async fn get_generation_key(State(state): State<AppState>) -> Result<Json<GenerationKeyResponse>> {
    if let Some(api_key) = &state.config.generation.api_key {
        return Ok(Json(GenerationKeyResponse {
            api_key: api_key.clone(),
        }));
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    if let Some(api_key) = SystemConfig::new(&mut conn).get(GENERATION_KEY).await? {
        return Ok(Json(GenerationKeyResponse { api_key }));
    }

    Err(Error::Internal {
        operation: "resolve generation API key: not configured in environment or system_config".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_key_from_config_wins(pool: PgPool) {
        let mut config = create_test_config();
        config.generation.api_key = Some("sk-from-env".to_string());
        let server = create_test_app_with_config(pool.clone(), config).await;

        let mut conn = pool.acquire().await.unwrap();
        SystemConfig::new(&mut conn).set(GENERATION_KEY, "sk-from-db").await.unwrap();

        let response = server.get("/api/v1/generation-key").await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["api_key"], "sk-from-env");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_key_falls_back_to_system_config(pool: PgPool) {
        let mut config = create_test_config();
        config.generation.api_key = None;
        let server = create_test_app_with_config(pool.clone(), config).await;

        let mut conn = pool.acquire().await.unwrap();
        SystemConfig::new(&mut conn).set(GENERATION_KEY, "sk-from-db").await.unwrap();

        let response = server.get("/api/v1/generation-key").await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["api_key"], "sk-from-db");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_key_everywhere_is_internal_error(pool: PgPool) {
        let mut config = create_test_config();
        config.generation.api_key = None;
        let server = create_test_app_with_config(pool, config).await;

        let response = server.get("/api/v1/generation-key").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_post_also_accepted(pool: PgPool) {
        let mut config = create_test_config();
        config.generation.api_key = Some("sk-abc".to_string());
        let server = create_test_app_with_config(pool, config).await;

        let response = server.post("/api/v1/generation-key").await;
        response.assert_status(StatusCode::OK);
    }
}
