//! API models for generation key retrieval.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationKeyResponse {
    pub api_key: String,
}
