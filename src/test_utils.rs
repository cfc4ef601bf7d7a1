//! Test utilities shared across handler tests.

use axum_test::TestServer;
use sqlx::PgPool;

use crate::{
    AppState, Config,
    db::{handlers::Profiles, models::profiles::UserProfileCreateDBRequest, models::profiles::UserProfileDBResponse},
};

/// Webhook secret used by signed-webhook tests
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!("atelier-test-emails-{}", std::process::id()));

    let mut config = Config::default();
    config.payments.api_key = Some("test-payment-key".to_string());
    config.payments.webhook_secret = Some(TEST_WEBHOOK_SECRET.to_string());
    config.content.token = Some("test-airtable-token".to_string());
    config.content.base_id = "appTESTBASE".to_string();
    // Small enough that rate-limit tests stay fast
    config.signup_guard.max_attempts = 3;
    config.email.transport = crate::config::EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().to_string(),
    };
    config
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    let state = AppState::builder().db(pool).config(config).http(reqwest::Client::new()).build();

    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to start test server")
}

pub async fn create_test_profile(pool: &PgPool, credits: i32) -> UserProfileDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    Profiles::new(&mut conn)
        .create(&UserProfileCreateDBRequest {
            email: Some(format!("user-{}@example.com", uuid::Uuid::new_v4())),
            credits,
            plan_type: Default::default(),
        })
        .await
        .expect("Failed to create test profile")
}
