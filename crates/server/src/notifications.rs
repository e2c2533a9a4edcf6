//! Notification feed endpoint.

use api_types::notification::{NotificationListResponse, NotificationView};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{ServerError, server::ServerState, user};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<u64>,
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<NotificationListResponse>, ServerError> {
    let notifications = state
        .engine
        .list_notifications(&user.username, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(NotificationListResponse {
        notifications: notifications
            .into_iter()
            .map(|n| NotificationView {
                id: n.id,
                kind: n.kind.as_str().to_string(),
                title: n.title,
                body: n.body,
                created_at: n.created_at,
            })
            .collect(),
    }))
}
