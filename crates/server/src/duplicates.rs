//! Duplicate review API endpoints.

use api_types::duplicate::{
    DuplicateListResponse, DuplicatePairRef, DuplicatePairView, DuplicateResolve,
};
use api_types::transaction::TransactionView;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, transactions, user};

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<DuplicateListResponse>, ServerError> {
    let pairs = state.engine.list_duplicate_pairs(&user.username).await?;
    Ok(Json(DuplicateListResponse {
        pairs: pairs
            .iter()
            .map(|pair| DuplicatePairView {
                first: transactions::view(&pair.first),
                second: transactions::view(&pair.second),
                linked_at: pair.linked_at,
            })
            .collect(),
    }))
}

pub async fn link(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<DuplicatePairRef>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .link_duplicates(&user.username, payload.first_id, payload.second_id)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn unlink(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<DuplicatePairRef>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .unlink_duplicates(&user.username, payload.first_id, payload.second_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a linked pair by merging the discard into the keep.
pub async fn resolve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<DuplicateResolve>,
) -> Result<Json<TransactionView>, ServerError> {
    let kept = state
        .engine
        .delete_duplicate_transaction(&user.username, payload.keep_id, payload.discard_id)
        .await?;
    Ok(Json(transactions::view(&kept)))
}

pub async fn dismiss(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let updated = state.engine.dismiss_duplicate(&user.username, id).await?;
    Ok(Json(transactions::view(&updated)))
}
