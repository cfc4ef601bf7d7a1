//! HTTP API layer: handlers, request/response models, and the OpenAPI doc.

pub mod handlers;
pub mod models;

use utoipa::OpenApi;

/// OpenAPI documentation for the client-facing API. The payment webhook is
/// deliberately excluded; it is called by the provider, not by clients.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::charges::create_charge,
        handlers::signup_guard::signup_guard,
        handlers::content::get_content,
        handlers::api_keys::get_generation_key,
        handlers::email::send_email,
        handlers::credits::get_balance,
        handlers::credits::list_transactions,
    ),
    components(schemas(
        models::charges::ChargeCreateRequest,
        models::signup::SignupGuardRequest,
        models::signup::SignupCheckResponse,
        models::signup::SignupLogResponse,
        models::email::EmailSendRequest,
        models::email::EmailSendResponse,
        models::generation::GenerationKeyResponse,
        models::credits::CreditBalanceResponse,
        models::credits::CreditTransactionResponse,
        models::credits::TransactionListResponse,
        crate::db::models::profiles::PlanType,
        crate::db::models::credits::CreditTransactionType,
    )),
    tags(
        (name = "payments", description = "Credit purchases"),
        (name = "signup", description = "Signup abuse protection"),
        (name = "content", description = "Proxied site content"),
        (name = "email", description = "Transactional email relay"),
        (name = "credits", description = "Balances and ledger history"),
    )
)]
pub struct ApiDoc;
