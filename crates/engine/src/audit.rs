//! Audit log entries.
//!
//! Append-only, best-effort: audit rows are written after the primary unit of
//! work commits, and a failed insert never rolls back or fails the primary
//! operation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Merged,
    Unmerged,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Merged => "merged",
            Self::Unmerged => "unmerged",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    /// JSON snapshot of the entity after the action.
    pub snapshot: String,
    pub recorded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn record(
    user_id: &str,
    entity_type: &str,
    entity_id: &str,
    action: AuditAction,
    snapshot: String,
    recorded_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        entity_type: ActiveValue::Set(entity_type.to_string()),
        entity_id: ActiveValue::Set(entity_id.to_string()),
        action: ActiveValue::Set(action.as_str().to_string()),
        snapshot: ActiveValue::Set(snapshot),
        recorded_at: ActiveValue::Set(recorded_at),
    }
}
