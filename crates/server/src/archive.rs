//! Merge, unmerge and archive API endpoints.

use api_types::archive::{ArchiveListResponse, MergeRequest, MergedTransactionView};
use api_types::transaction::TransactionView;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, transactions, user};

fn archived_view(archived: &engine::MergedTransaction) -> MergedTransactionView {
    MergedTransactionView {
        id: archived.id,
        merged_into: archived.merged_into,
        merged_at: archived.merged_at,
        snapshot: transactions::view(&archived.snapshot),
        transferred_external_ids: archived.transferred_external_ids.clone(),
    }
}

pub async fn merge(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<MergeRequest>,
) -> Result<Json<TransactionView>, ServerError> {
    let kept = state
        .engine
        .merge_transactions(&user.username, payload.keep_id, payload.discard_id)
        .await?;
    Ok(Json(transactions::view(&kept)))
}

pub async fn unmerge(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let restored = state.engine.unmerge_transaction(&user.username, id).await?;
    Ok(Json(transactions::view(&restored)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ArchiveListResponse>, ServerError> {
    let merged = state.engine.list_merged_transactions(&user.username).await?;
    Ok(Json(ArchiveListResponse {
        merged: merged.iter().map(archived_view).collect(),
    }))
}
