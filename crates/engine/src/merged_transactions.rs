//! Archive of merged transactions.
//!
//! When a duplicate pair is merged, the discarded transaction is hard-deleted
//! from the live tables and its full state is written here, keyed by its
//! original id. The snapshot is denormalized (movements included) so that
//! unmerge can recreate the row verbatim without depending on the live schema.
//!
//! This table is the system of record for "did this logical transaction get
//! merged, and into what." Rows are removed only by unmerge.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Transaction};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedTransaction {
    /// The discarded transaction's original id.
    pub id: Uuid,
    pub user_id: String,
    /// The survivor's id.
    pub merged_into: Uuid,
    pub merged_at: DateTime<Utc>,
    /// Full pre-merge state of the discarded transaction, movements included.
    pub snapshot: Transaction,
    /// Exactly the external ids merge moved onto the survivor; unmerge takes
    /// these back.
    pub transferred_external_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "merged_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub merged_into: String,
    pub merged_at: DateTimeUtc,
    /// JSON snapshot of the discarded [`Transaction`].
    pub snapshot: String,
    /// JSON array of strings.
    pub transferred_external_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&MergedTransaction> for ActiveModel {
    type Error = EngineError;

    fn try_from(archived: &MergedTransaction) -> Result<Self, Self::Error> {
        let snapshot = serde_json::to_string(&archived.snapshot)
            .map_err(|_| EngineError::InvalidInput("unserializable snapshot".to_string()))?;
        let transferred = serde_json::to_string(&archived.transferred_external_ids)
            .map_err(|_| EngineError::InvalidInput("unserializable external ids".to_string()))?;
        Ok(Self {
            id: ActiveValue::Set(archived.id.to_string()),
            user_id: ActiveValue::Set(archived.user_id.clone()),
            merged_into: ActiveValue::Set(archived.merged_into.to_string()),
            merged_at: ActiveValue::Set(archived.merged_at),
            snapshot: ActiveValue::Set(snapshot),
            transferred_external_ids: ActiveValue::Set(transferred),
        })
    }
}

impl TryFrom<Model> for MergedTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("archive entry not exists".to_string()))?,
            user_id: model.user_id,
            merged_into: Uuid::parse_str(&model.merged_into)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            merged_at: model.merged_at,
            snapshot: serde_json::from_str(&model.snapshot)
                .map_err(|_| EngineError::InvalidInput("invalid archive snapshot".to_string()))?,
            transferred_external_ids: serde_json::from_str(&model.transferred_external_ids)
                .map_err(|_| {
                    EngineError::InvalidInput("invalid archived external ids".to_string())
                })?,
        })
    }
}
