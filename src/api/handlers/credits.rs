//! Credit balance and ledger history endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    api::models::credits::{CreditBalanceResponse, TransactionListQuery, TransactionListResponse},
    db::{
        errors::DbError,
        handlers::{Credits, Profiles},
    },
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};

#[utoipa::path(
    get,
    path = "/users/{user_id}/credits",
    params(("user_id" = Uuid, Path, description = "User profile id")),
    responses(
        (status = 200, description = "Current balance and plan", body = CreditBalanceResponse),
        (status = 404, description = "No profile with this id"),
    ),
    tag = "credits"
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)))]
pub async fn get_balance(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<Json<CreditBalanceResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let profile = Profiles::new(&mut conn).get(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User profile".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/transactions",
    params(
        ("user_id" = Uuid, Path, description = "User profile id"),
        TransactionListQuery,
    ),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = TransactionListResponse),
    ),
    tag = "credits"
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&user_id)))]
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut credits = Credits::new(&mut conn);

    let transactions = credits.list_user_transactions(user_id, query.skip(), query.limit()).await?;
    let total = credits.count_user_transactions(user_id).await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(Into::into).collect(),
        total,
    }))
}
