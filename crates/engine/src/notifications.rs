//! Notification records.
//!
//! Write-only sink: the engine appends one row per event and never reads them
//! back on a primary path. Insertion failures are logged, never retried, and
//! never fail the originating write.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DuplicateDetected,
    ReconciliationInvalidated,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateDetected => "duplicate_detected",
            Self::ReconciliationInvalidated => "reconciliation_invalidated",
        }
    }
}

impl TryFrom<&str> for NotificationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "duplicate_detected" => Ok(Self::DuplicateDetected),
            "reconciliation_invalidated" => Ok(Self::ReconciliationInvalidated),
            other => Err(EngineError::InvalidInput(format!(
                "invalid notification kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Notification> for ActiveModel {
    fn from(notification: &Notification) -> Self {
        Self {
            id: ActiveValue::Set(notification.id.to_string()),
            user_id: ActiveValue::Set(notification.user_id.clone()),
            kind: ActiveValue::Set(notification.kind.as_str().to_string()),
            title: ActiveValue::Set(notification.title.clone()),
            body: ActiveValue::Set(notification.body.clone()),
            created_at: ActiveValue::Set(notification.created_at),
        }
    }
}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("notification not exists".to_string()))?,
            user_id: model.user_id,
            kind: NotificationKind::try_from(model.kind.as_str())?,
            title: model.title,
            body: model.body,
            created_at: model.created_at,
        })
    }
}
