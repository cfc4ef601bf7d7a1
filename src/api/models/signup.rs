//! API models for the signup guard.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Signup guard request. `action` is matched by hand rather than as an enum
/// so unrecognised values produce a 400 instead of a deserialization failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupGuardRequest {
    /// Either "check" or "log"
    pub action: String,
    /// Browser fingerprint, when the client computed one
    pub fingerprint: Option<String>,
    pub email: Option<String>,
    /// For "log": whether the signup ultimately succeeded
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupCheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupLogResponse {
    pub success: bool,
}
