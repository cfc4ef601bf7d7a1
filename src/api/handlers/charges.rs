//! Charge creation against the payment provider.

use axum::{Json, extract::State};
use serde_json::Value;

use crate::{
    AppState,
    api::models::charges::ChargeCreateRequest,
    errors::{Error, Result},
    payments::{ChargeMetadata, ChargeRequest, LocalPrice, PaymentClient},
};

/// Create a fixed-price charge for one of the configured credit packs.
///
/// The client only picks a price point; the credits granted and the charge
/// metadata come from the server-side pack definition, so a tampered amount
/// or credit count never reaches the provider.
#[utoipa::path(
    post,
    path = "/charges",
    request_body = ChargeCreateRequest,
    responses(
        (status = 200, description = "Provider charge object, including the hosted payment URL"),
        (status = 400, description = "Amount does not match any credit pack"),
        (status = 502, description = "Payment provider rejected the request"),
    ),
    tag = "payments"
)]
#[tracing::instrument(skip_all, fields(amount = %request.amount))]
pub async fn create_charge(State(state): State<AppState>, Json(request): Json<ChargeCreateRequest>) -> Result<Json<Value>> {
    // Validate against the price list before any external call
    let Some(pack) = state.config.payments.find_pack(request.amount) else {
        return Err(Error::BadRequest {
            message: "Amount does not match any available credit pack".to_string(),
        });
    };

    let client = PaymentClient::from_config(state.http.clone(), &state.config.payments)?;

    let charge = client
        .create_charge(&ChargeRequest {
            name: format!("{} pack", pack.name),
            description: format!("{} image generation credits", pack.credits),
            pricing_type: "fixed_price".to_string(),
            local_price: LocalPrice {
                amount: pack.amount.to_string(),
                currency: "USD".to_string(),
            },
            metadata: ChargeMetadata {
                user_id: request.user_id.to_string(),
                credits: pack.credits,
                plan: Some(pack.name.to_ascii_lowercase()),
            },
            redirect_url: format!("{}/credits?status=success", state.config.site_url),
            cancel_url: format!("{}/credits?status=cancelled", state.config.site_url),
        })
        .await?;

    Ok(Json(charge))
}
