//! Transaction API endpoints.

use api_types::transaction::{
    MovementNew, MovementView, TransactionList, TransactionListResponse, TransactionNew,
    TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn view(tx: &engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        date: tx.date,
        description: tx.description.clone(),
        place: tx.place.clone(),
        partner: tx.partner.clone(),
        notes: tx.notes.clone(),
        external_ids: tx.external_ids.clone(),
        suspicious_reasons: tx
            .suspicious_reasons
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
        dismissed: tx.dismissed,
        movements: tx
            .movements
            .iter()
            .map(|m| MovementView {
                id: m.id,
                account_id: m.account_id,
                currency_id: m.currency_id,
                amount: m.amount,
            })
            .collect(),
    }
}

fn drafts(movements: Vec<MovementNew>) -> Vec<engine::MovementDraft> {
    movements
        .into_iter()
        .map(|m| {
            let mut draft = engine::MovementDraft::new(m.currency_id, m.amount);
            if let Some(account_id) = m.account_id {
                draft = draft.account_id(account_id);
            }
            draft
        })
        .collect()
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = engine::TransactionListFilter {
        from: payload.from,
        to: payload.to,
        account_id: payload.account_id,
        only_flagged: payload.only_flagged.unwrap_or(false),
        limit: payload.limit,
    };
    let transactions = state
        .engine
        .list_transactions(&user.username, &filter)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.iter().map(view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd =
        engine::CreateTransactionCmd::new(&user.username, payload.date, payload.description);
    cmd.place = payload.place;
    cmd.partner = payload.partner;
    cmd.notes = payload.notes;
    cmd.external_ids = payload.external_ids;
    cmd.movements = drafts(payload.movements);

    let created = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(&created))))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(&user.username, id).await?;
    Ok(Json(view(&tx)))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = engine::UpdateTransactionCmd::new(&user.username, id);
    cmd.date = payload.date;
    cmd.description = payload.description;
    cmd.place = payload.place;
    cmd.partner = payload.partner;
    cmd.notes = payload.notes;
    cmd.movements = payload.movements.map(drafts);

    let updated = state.engine.update_transaction(cmd).await?;
    Ok(Json(view(&updated)))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
