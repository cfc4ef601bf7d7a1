//! Signup abuse protection.
//!
//! Two actions over one endpoint: `check` asks whether a signup from this
//! IP/fingerprint is still within rate bounds, `log` records an attempt.
//! The guard is strictly fail-open: a broken database, a missing rate
//! function, or a disabled config must never block a signup.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::signup::{SignupCheckResponse, SignupGuardRequest, SignupLogResponse},
    db::{handlers::Signups, models::signups::SignupAttemptCreateDBRequest},
    errors::{Error, Result},
};

#[utoipa::path(
    post,
    path = "/signup-guard",
    request_body = SignupGuardRequest,
    responses(
        (status = 200, description = "Check verdict or log acknowledgement"),
        (status = 400, description = "Unknown action"),
    ),
    tag = "signup"
)]
#[tracing::instrument(skip_all, fields(action = %request.action))]
pub async fn signup_guard(State(state): State<AppState>, headers: HeaderMap, Json(request): Json<SignupGuardRequest>) -> Result<Response> {
    let ip_address = client_ip(&headers);

    match request.action.as_str() {
        "check" => {
            let allowed = check_rate(&state, &ip_address, request.fingerprint.as_deref()).await;
            Ok(Json(SignupCheckResponse { allowed }).into_response())
        }
        "log" => {
            let attempt = SignupAttemptCreateDBRequest {
                ip_address,
                fingerprint: request.fingerprint,
                email: request.email,
                user_agent: headers
                    .get(axum::http::header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                success: request.success,
            };

            let success = match log_attempt(&state, &attempt).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to log signup attempt: {:#}", e);
                    false
                }
            };
            Ok(Json(SignupLogResponse { success }).into_response())
        }
        other => Err(Error::BadRequest {
            message: format!("Unknown action: {other}"),
        }),
    }
}

/// Rate verdict with fail-open semantics baked in
async fn check_rate(state: &AppState, ip_address: &str, fingerprint: Option<&str>) -> bool {
    let guard = &state.config.signup_guard;
    if !guard.enabled {
        return true;
    }

    let result = async {
        let mut conn = state.db.acquire().await?;
        let allowed = Signups::new(&mut conn)
            .check_rate(ip_address, fingerprint, guard.window(), guard.max_attempts)
            .await?;
        anyhow::Ok(allowed)
    }
    .await;

    match result {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::warn!("Signup rate check failed, allowing signup: {:#}", e);
            true
        }
    }
}

async fn log_attempt(state: &AppState, attempt: &SignupAttemptCreateDBRequest) -> anyhow::Result<()> {
    let mut conn = state.db.acquire().await?;
    Signups::new(&mut conn).log_attempt(attempt).await?;
    Ok(())
}

/// Client IP from proxy headers. The service always runs behind a proxy or
/// CDN, so the socket address is not useful here.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string())
}
