//! Reconciliation overview endpoint.

use api_types::reconciliation::{AccountOverviewView, OverviewResponse};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, accounts, checkpoints, server::ServerState, user};

pub async fn overview(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<OverviewResponse>, ServerError> {
    let overview = state.engine.reconciliation_overview(&user.username).await?;
    Ok(Json(OverviewResponse {
        accounts: overview
            .iter()
            .map(|entry| AccountOverviewView {
                account: accounts::view(&entry.account),
                balance: entry.balance,
                latest_checkpoint: entry.latest_checkpoint.as_ref().map(checkpoints::view),
                last_transaction_at: entry.last_transaction_at,
                unprocessed: entry.unprocessed,
            })
            .collect(),
    }))
}
