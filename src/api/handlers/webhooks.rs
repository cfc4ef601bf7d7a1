//! Payment provider webhook ingestion.
//!
//! The provider POSTs charge lifecycle events here, signed with HMAC-SHA256
//! over the raw body. Only `charge:confirmed` mutates state: it credits the
//! purchased amount to the profile named in the charge metadata and appends
//! one ledger row, keyed by the charge code so redeliveries are idempotent.

use axum::{Json, extract::State, http::HeaderMap};
use bytes::Bytes;
use serde_json::{Value, json};

use crate::{
    AppState,
    db::{
        errors::DbError,
        handlers::Credits,
        models::{
            credits::{CreditPurchaseDBRequest, PurchaseOutcome},
            profiles::PlanType,
        },
    },
    errors::{Error, Result},
    payments::signature::{SIGNATURE_HEADER, verify_signature},
    types::abbrev_uuid,
};

#[tracing::instrument(skip_all)]
pub async fn payment_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Json<Value>> {
    // Verify the signature over the raw body before touching the payload.
    // With no secret configured the check is skipped entirely (local testing).
    match &state.config.payments.webhook_secret {
        Some(secret) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or(Error::InvalidSignature)?;

            if !verify_signature(secret, &body, signature) {
                return Err(Error::InvalidSignature);
            }
        }
        None => {
            tracing::warn!("No webhook secret configured - accepting unsigned payment events");
        }
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|_| Error::BadRequest {
        message: "Invalid JSON payload".to_string(),
    })?;

    let event_type = payload["event"]["type"].as_str().ok_or_else(|| Error::BadRequest {
        message: "Missing event type".to_string(),
    })?;

    if event_type != "charge:confirmed" {
        tracing::info!(event_type, "Ignoring payment event");
        return Ok(Json(json!({ "received": true })));
    }

    let data = &payload["event"]["data"];
    let charge_code = data["code"].as_str().ok_or_else(|| Error::BadRequest {
        message: "Missing charge code".to_string(),
    })?;

    let metadata = &data["metadata"];
    let user_id = metadata["user_id"]
        .as_str()
        .ok_or_else(|| Error::BadRequest {
            message: "Missing user_id in charge metadata".to_string(),
        })?
        .parse::<uuid::Uuid>()
        .map_err(|_| Error::BadRequest {
            message: "Invalid user_id in charge metadata".to_string(),
        })?;

    let credits = parse_credits(&metadata["credits"]).ok_or_else(|| Error::BadRequest {
        message: "Missing or invalid credits in charge metadata".to_string(),
    })?;

    let plan = metadata["plan"].as_str().map(PlanType::parse_or_default);

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let outcome = Credits::new(&mut conn)
        .record_purchase(&CreditPurchaseDBRequest {
            user_id,
            amount: credits,
            source_id: charge_code.to_string(),
            description: Some(format!("Purchased {credits} credits")),
            metadata: metadata.is_object().then(|| metadata.clone()),
            plan,
        })
        .await
        .map_err(|e| match e {
            // A signed, confirmed charge for an unknown profile is a storage
            // problem on our side; answer 500 so the provider retries
            DbError::NotFound => Error::Internal {
                operation: format!("credit user {}", abbrev_uuid(&user_id)),
            },
            other => Error::Database(other),
        })?;

    match outcome {
        PurchaseOutcome::Applied(tx) => {
            tracing::info!(
                user_id = %abbrev_uuid(&user_id),
                credits,
                charge_code,
                transaction_id = tx.id,
                "Credited confirmed charge"
            );
        }
        PurchaseOutcome::AlreadyProcessed => {
            tracing::info!(charge_code, "Charge already processed, acknowledging redelivery");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Charge metadata travels through the provider as loosely-typed JSON; accept
/// the credit count as either a number or a numeric string.
fn parse_credits(value: &Value) -> Option<i32> {
    let credits = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse::<i64>().ok()?,
        _ => return None,
    };

    (credits > 0).then_some(i32::try_from(credits).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Profiles;
    use crate::payments::signature::sign_payload;
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use sqlx::PgPool;

    fn confirmed_charge(code: &str, user_id: uuid::Uuid, credits: Value) -> Value {
        json!({
            "event": {
                "type": "charge:confirmed",
                "data": {
                    "code": code,
                    "metadata": {
                        "user_id": user_id.to_string(),
                        "credits": credits,
                    }
                }
            }
        })
    }

    async fn post_signed(server: &axum_test::TestServer, payload: &Value) -> axum_test::TestResponse {
        let body = serde_json::to_vec(payload).unwrap();
        let signature = sign_payload(TEST_WEBHOOK_SECRET, &body);
        server
            .post("/webhooks/payments")
            .add_header(SIGNATURE_HEADER, signature)
            .bytes(body.into())
            .await
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_confirmed_charge_credits_balance(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 100).await;

        let payload = confirmed_charge("CHARGE-1", profile.id, json!(500));
        let response = post_signed(&server, &payload).await;

        response.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.credits, 600);

        let count = Credits::new(&mut conn).count_user_transactions(profile.id).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_redelivered_charge_credits_once(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = confirmed_charge("CHARGE-DUP", profile.id, json!(250));
        post_signed(&server, &payload).await.assert_status(StatusCode::OK);
        post_signed(&server, &payload).await.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.credits, 250);

        let count = Credits::new(&mut conn).count_user_transactions(profile.id).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_signature_rejected_without_mutation(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = confirmed_charge("CHARGE-2", profile.id, json!(500));
        let body = serde_json::to_vec(&payload).unwrap();

        let response = server
            .post("/webhooks/payments")
            .add_header(SIGNATURE_HEADER, sign_payload("wrong-secret", &body))
            .bytes(body.into())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.credits, 0);
        let count = Credits::new(&mut conn).count_user_transactions(profile.id).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_signature_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = confirmed_charge("CHARGE-3", profile.id, json!(500));
        let response = server
            .post("/webhooks/payments")
            .bytes(serde_json::to_vec(&payload).unwrap().into())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unsigned_event_accepted_in_open_mode(pool: PgPool) {
        let mut config = create_test_config();
        config.payments.webhook_secret = None;
        let server = create_test_app_with_config(pool.clone(), config).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = confirmed_charge("CHARGE-OPEN", profile.id, json!(100));
        let response = server
            .post("/webhooks/payments")
            .bytes(serde_json::to_vec(&payload).unwrap().into())
            .await;

        response.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.credits, 100);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_metadata_is_bad_request(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let payload = json!({
            "event": {
                "type": "charge:confirmed",
                "data": { "code": "CHARGE-4", "metadata": {} }
            }
        });
        let response = post_signed(&server, &payload).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_user_id_is_bad_request(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let payload = json!({
            "event": {
                "type": "charge:confirmed",
                "data": {
                    "code": "CHARGE-5",
                    "metadata": { "user_id": "not-a-uuid", "credits": 100 }
                }
            }
        });
        let response = post_signed(&server, &payload).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_positive_credits_is_bad_request(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        for credits in [json!(0), json!(-50)] {
            let payload = confirmed_charge("CHARGE-6", profile.id, credits);
            post_signed(&server, &payload).await.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_credits_as_numeric_string_accepted(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = confirmed_charge("CHARGE-7", profile.id, json!("750"));
        post_signed(&server, &payload).await.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.credits, 750);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_plan_metadata_updates_profile(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = json!({
            "event": {
                "type": "charge:confirmed",
                "data": {
                    "code": "CHARGE-8",
                    "metadata": {
                        "user_id": profile.id.to_string(),
                        "credits": 3500,
                        "plan": "pro"
                    }
                }
            }
        });
        post_signed(&server, &payload).await.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.plan_type, PlanType::Pro);
        assert_eq!(updated.subscription_status, "active");
        assert_eq!(updated.credits, 3500);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_plan_defaults_to_free(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        let payload = json!({
            "event": {
                "type": "charge:confirmed",
                "data": {
                    "code": "CHARGE-9",
                    "metadata": {
                        "user_id": profile.id.to_string(),
                        "credits": 100,
                        "plan": "platinum-deluxe"
                    }
                }
            }
        });
        post_signed(&server, &payload).await.assert_status(StatusCode::OK);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Profiles::new(&mut conn).get(profile.id).await.unwrap().unwrap();
        assert_eq!(updated.plan_type, PlanType::Free);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_other_event_types_acknowledged_without_mutation(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let profile = create_test_profile(&pool, 0).await;

        for event_type in ["charge:created", "charge:pending", "charge:failed"] {
            let payload = json!({
                "event": {
                    "type": event_type,
                    "data": {
                        "code": "CHARGE-10",
                        "metadata": { "user_id": profile.id.to_string(), "credits": 500 }
                    }
                }
            });
            post_signed(&server, &payload).await.assert_status(StatusCode::OK);
        }

        let mut conn = pool.acquire().await.unwrap();
        let count = Credits::new(&mut conn).count_user_transactions(profile.id).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_profile_is_internal_error(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let payload = confirmed_charge("CHARGE-11", uuid::Uuid::new_v4(), json!(100));
        let response = post_signed(&server, &payload).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_method_not_allowed(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let response = server.get("/webhooks/payments").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_malformed_json_is_bad_request(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let body = b"not json".to_vec();
        let signature = sign_payload(TEST_WEBHOOK_SECRET, &body);
        let response = server
            .post("/webhooks/payments")
            .add_header(SIGNATURE_HEADER, signature)
            .bytes(body.into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
