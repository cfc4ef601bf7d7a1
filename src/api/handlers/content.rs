//! Read-only content proxy in front of Airtable.
//!
//! Keeps the Airtable token server-side and lets browsers cache the
//! responses. Only allow-listed tables are reachable, and the category
//! filter is restricted to the Portfolio table with the value stripped to
//! letters before it is embedded in the filter formula.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde_json::Value;

use crate::{
    AppState,
    airtable::AirtableClient,
    api::models::content::ContentQuery,
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/content",
    params(ContentQuery),
    responses(
        (status = 200, description = "Airtable record list"),
        (status = 400, description = "Table not on the allow-list"),
        (status = 502, description = "Airtable request failed"),
    ),
    tag = "content"
)]
#[tracing::instrument(skip_all, fields(table = %query.table))]
pub async fn get_content(State(state): State<AppState>, Query(query): Query<ContentQuery>) -> Result<impl IntoResponse> {
    let content = &state.config.content;

    if !content.allowed_tables.iter().any(|t| t == &query.table) {
        return Err(Error::BadRequest {
            message: format!("Table '{}' is not available", query.table),
        });
    }

    // Category filtering only applies to the Portfolio table
    let filter = if query.table == "Portfolio" {
        query
            .category
            .as_deref()
            .map(sanitize_category)
            .filter(|c| !c.is_empty())
            .map(|c| format!("{{Category}}='{c}'"))
    } else {
        None
    };

    let client = AirtableClient::from_config(state.http.clone(), content)?;
    let records: Value = client.list_records(&query.table, filter.as_deref()).await?;

    let cache_control = format!("public, max-age={}", content.cache_max_age);
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(records)))
}

/// Strip a category value to ASCII letters. The result lands inside an
/// Airtable formula string, so everything else is dropped.
fn sanitize_category(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}
