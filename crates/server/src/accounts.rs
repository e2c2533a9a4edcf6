//! Account API endpoints.

use api_types::account::{AccountNew, AccountView, BalanceResponse, UnprocessedResponse};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn view(account: &engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name.clone(),
        currency_id: account.currency_id,
        opening_balance: account.opening_balance,
    }
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.list_accounts(&user.username).await?;
    Ok(Json(accounts.iter().map(view).collect()))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd = engine::CreateAccountCmd::new(&user.username, payload.name, payload.currency_id);
    if let Some(balance) = payload.opening_balance {
        cmd = cmd.opening_balance(balance);
    }

    let created = state.engine.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(&created))))
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    /// Defaults to the account's native currency.
    pub currency_id: Option<Uuid>,
    pub as_of: Option<DateTime<Utc>>,
}

pub async fn balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ServerError> {
    let balance = state
        .engine
        .account_balance(&user.username, id, query.currency_id, query.as_of)
        .await?;
    Ok(Json(BalanceResponse {
        account_id: id,
        balance,
        as_of: query.as_of,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UnprocessedQuery {
    /// Transactions dated before this are not counted.
    pub ignore_before: Option<DateTime<Utc>>,
}

pub async fn unprocessed(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UnprocessedQuery>,
) -> Result<Json<UnprocessedResponse>, ServerError> {
    let unprocessed = state
        .engine
        .unprocessed_count(&user.username, id, query.ignore_before)
        .await?;
    Ok(Json(UnprocessedResponse {
        account_id: id,
        unprocessed,
    }))
}
