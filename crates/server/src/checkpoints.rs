//! Reconciliation checkpoint API endpoints.

use api_types::checkpoint::{CheckpointListResponse, CheckpointNew, CheckpointView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn view(checkpoint: &engine::ReconciliationCheckpoint) -> CheckpointView {
    CheckpointView {
        id: checkpoint.id,
        account_id: checkpoint.account_id,
        currency_id: checkpoint.currency_id,
        checkpoint_at: checkpoint.checkpoint_at,
        balance: checkpoint.balance,
        expected_balance: checkpoint.expected_balance,
        manual: checkpoint.manual,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckpointListQuery {
    pub account_id: Option<Uuid>,
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CheckpointListQuery>,
) -> Result<Json<CheckpointListResponse>, ServerError> {
    let checkpoints = state
        .engine
        .list_checkpoints(&user.username, query.account_id)
        .await?;
    Ok(Json(CheckpointListResponse {
        checkpoints: checkpoints.iter().map(view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CheckpointNew>,
) -> Result<(StatusCode, Json<CheckpointView>), ServerError> {
    let mut cmd = engine::CreateCheckpointCmd::new(
        &user.username,
        payload.account_id,
        payload.currency_id,
        payload.checkpoint_at,
    );
    if let Some(expected) = payload.expected_balance {
        cmd = cmd.expected_balance(expected);
    }

    let created = state.engine.create_checkpoint(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(&created))))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_checkpoint(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
