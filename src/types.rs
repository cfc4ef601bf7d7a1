//! Shared identifier types used across API and database layers.

use uuid::Uuid;

pub type UserId = Uuid;

/// Abbreviate a UUID for log output (first 8 hex chars)
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string()[..8].to_string()
}
