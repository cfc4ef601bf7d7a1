//! API models for the content proxy.

use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ContentQuery {
    /// Airtable table to read; must be on the configured allow-list
    pub table: String,
    /// Category filter, honoured only for the Portfolio table
    pub category: Option<String>,
}
