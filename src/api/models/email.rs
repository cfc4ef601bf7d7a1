//! API models for the email relay.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailSendRequest {
    pub to: String,
    pub subject: String,
    /// Plain-text body
    pub text: Option<String>,
    /// HTML body
    pub html: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmailSendResponse {
    pub success: bool,
}
