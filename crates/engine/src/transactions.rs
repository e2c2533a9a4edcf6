//! Transaction primitives.
//!
//! A `Transaction` is one unit of ledger history: a dated event with free-form
//! metadata and one or more [`Movement`](crate::Movement)s. `date` is the date
//! of financial effect and is distinct from `created_at`.
//!
//! `external_ids` carries the identifiers a bank import attached to the row.
//! A transaction with a non-empty list cannot be hard-deleted by a user; it
//! can only disappear by being merged into a survivor.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Movement, ResultEngine};

/// Why a transaction is flagged for review.
///
/// Today there is a single reason, but the column is set-valued so unrelated
/// reasons added later do not clobber each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousReason {
    DuplicateCandidate,
}

impl SuspiciousReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateCandidate => "duplicate_candidate",
        }
    }
}

impl TryFrom<&str> for SuspiciousReason {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "duplicate_candidate" => Ok(Self::DuplicateCandidate),
            other => Err(EngineError::InvalidInput(format!(
                "invalid suspicious reason: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub place: Option<String>,
    pub partner: Option<String>,
    pub notes: Option<String>,
    pub external_ids: Vec<String>,
    pub suspicious_reasons: Vec<SuspiciousReason>,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub movements: Vec<Movement>,
}

impl Transaction {
    pub fn new(
        user_id: String,
        date: DateTime<Utc>,
        description: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            description,
            place: None,
            partner: None,
            notes: None,
            external_ids: Vec::new(),
            suspicious_reasons: Vec::new(),
            dismissed: false,
            created_at,
            updated_at: created_at,
            deleted_at: None,
            movements: Vec::new(),
        }
    }

    pub fn is_suspicious(&self, reason: SuspiciousReason) -> bool {
        self.suspicious_reasons.contains(&reason)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub date: DateTimeUtc,
    pub description: String,
    pub place: Option<String>,
    pub partner: Option<String>,
    pub notes: Option<String>,
    /// JSON array of strings.
    pub external_ids: String,
    /// JSON array of [`SuspiciousReason`] values.
    pub suspicious_reasons: String,
    pub dismissed: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn encode_external_ids(ids: &[String]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_external_ids(raw: &str) -> ResultEngine<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|_| EngineError::InvalidInput("invalid external_ids column".to_string()))
}

pub(crate) fn encode_reasons(reasons: &[SuspiciousReason]) -> String {
    serde_json::to_string(reasons).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_reasons(raw: &str) -> ResultEngine<Vec<SuspiciousReason>> {
    serde_json::from_str(raw)
        .map_err(|_| EngineError::InvalidInput("invalid suspicious_reasons column".to_string()))
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            date: ActiveValue::Set(tx.date),
            description: ActiveValue::Set(tx.description.clone()),
            place: ActiveValue::Set(tx.place.clone()),
            partner: ActiveValue::Set(tx.partner.clone()),
            notes: ActiveValue::Set(tx.notes.clone()),
            external_ids: ActiveValue::Set(encode_external_ids(&tx.external_ids)),
            suspicious_reasons: ActiveValue::Set(encode_reasons(&tx.suspicious_reasons)),
            dismissed: ActiveValue::Set(tx.dismissed),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
            deleted_at: ActiveValue::Set(tx.deleted_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            date: model.date,
            description: model.description,
            place: model.place,
            partner: model.partner,
            notes: model.notes,
            external_ids: decode_external_ids(&model.external_ids)?,
            suspicious_reasons: decode_reasons(&model.suspicious_reasons)?,
            dismissed: model.dismissed,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
            movements: Vec::new(),
        })
    }
}
