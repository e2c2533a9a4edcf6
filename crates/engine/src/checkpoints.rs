//! Reconciliation checkpoints.
//!
//! A checkpoint certifies: "the balance of account X in currency Y was B at
//! time T; everything dated at or before T is settled." It is a trust
//! boundary, not a cache: the invalidation engine deletes checkpoints whose
//! boundary a later write violates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_decimal};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCheckpoint {
    pub id: Uuid,
    pub user_id: String,
    pub account_id: Uuid,
    pub currency_id: Uuid,
    /// Certification time: the trust boundary.
    pub checkpoint_at: DateTime<Utc>,
    /// The balance certified at `checkpoint_at`.
    pub balance: Decimal,
    /// The statement figure the user reconciled against, when given.
    pub expected_balance: Option<Decimal>,
    /// True for user-initiated checkpoints, false for automated ones.
    pub manual: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_checkpoints")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub currency_id: String,
    pub checkpoint_at: DateTimeUtc,
    pub balance: String,
    pub expected_balance: Option<String>,
    pub manual: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ReconciliationCheckpoint> for ActiveModel {
    fn from(checkpoint: &ReconciliationCheckpoint) -> Self {
        Self {
            id: ActiveValue::Set(checkpoint.id.to_string()),
            user_id: ActiveValue::Set(checkpoint.user_id.clone()),
            account_id: ActiveValue::Set(checkpoint.account_id.to_string()),
            currency_id: ActiveValue::Set(checkpoint.currency_id.to_string()),
            checkpoint_at: ActiveValue::Set(checkpoint.checkpoint_at),
            balance: ActiveValue::Set(checkpoint.balance.to_string()),
            expected_balance: ActiveValue::Set(
                checkpoint.expected_balance.map(|b| b.to_string()),
            ),
            manual: ActiveValue::Set(checkpoint.manual),
            created_at: ActiveValue::Set(checkpoint.created_at),
        }
    }
}

impl TryFrom<Model> for ReconciliationCheckpoint {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let expected_balance = match model.expected_balance {
            Some(raw) => Some(parse_decimal(&raw, "expected balance")?),
            None => None,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("checkpoint not exists".to_string()))?,
            user_id: model.user_id,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            currency_id: Uuid::parse_str(&model.currency_id)
                .map_err(|_| EngineError::KeyNotFound("currency not exists".to_string()))?,
            checkpoint_at: model.checkpoint_at,
            balance: parse_decimal(&model.balance, "checkpoint balance")?,
            expected_balance,
            manual: model.manual,
            created_at: model.created_at,
        })
    }
}
