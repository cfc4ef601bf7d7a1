//! Transactional email relay.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::email::{EmailSendRequest, EmailSendResponse},
    email::EmailService,
    errors::{Error, Result},
};

#[utoipa::path(
    post,
    path = "/emails",
    request_body = EmailSendRequest,
    responses(
        (status = 200, description = "Email handed to the transport", body = EmailSendResponse),
        (status = 400, description = "Missing recipient, subject, or body"),
    ),
    tag = "email"
)]
#[tracing::instrument(skip_all)]
pub async fn send_email(State(state): State<AppState>, Json(request): Json<EmailSendRequest>) -> Result<Json<EmailSendResponse>> {
    if request.to.trim().is_empty() || request.subject.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Both 'to' and 'subject' are required".to_string(),
        });
    }

    if request.text.is_none() && request.html.is_none() {
        return Err(Error::BadRequest {
            message: "Either 'text' or 'html' body is required".to_string(),
        });
    }

    let service = EmailService::new(&state.config)?;
    service
        .send(&request.to, &request.subject, request.text.as_deref(), request.html.as_deref())
        .await?;

    tracing::info!(to = %request.to, "Relayed email");

    Ok(Json(EmailSendResponse { success: true }))
}
