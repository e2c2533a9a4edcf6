//! Best-effort observers: notifications and the audit log.
//!
//! Both are written *after* the primary unit of work commits and on the
//! shared connection, never inside the caller's transaction. A failed insert
//! is logged at `warn` and swallowed; it must never make a committed primary
//! mutation look like a failure.

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{Notification, NotificationKind, ResultEngine, audit, audit::AuditAction, notifications};

use super::Engine;

impl Engine {
    pub(crate) async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            kind,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        };
        if let Err(err) = notifications::ActiveModel::from(&notification)
            .insert(&self.database)
            .await
        {
            tracing::warn!(user = user_id, kind = kind.as_str(), "failed to write notification: {err}");
        }
    }

    pub(crate) async fn audit<T: Serialize>(
        &self,
        user_id: &str,
        entity_type: &str,
        entity_id: &str,
        action: AuditAction,
        entity: &T,
    ) {
        let snapshot = match serde_json::to_string(entity) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(user = user_id, entity_type, "failed to serialize audit snapshot: {err}");
                return;
            }
        };
        let record = audit::record(user_id, entity_type, entity_id, action, snapshot, Utc::now());
        if let Err(err) = record.insert(&self.database).await {
            tracing::warn!(user = user_id, entity_type, "failed to write audit record: {err}");
        }
    }

    /// Most recent notifications for an owner, newest first.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Notification>> {
        let models = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Notification::try_from).collect()
    }
}
