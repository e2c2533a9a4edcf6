//! Transaction movements.
//!
//! A [`Movement`] is a single (account, currency, signed amount) leg of a
//! [`Transaction`](crate::Transaction). Amounts are arbitrary-precision
//! [`Decimal`]s; binary floating point never touches a monetary value.
//!
//! An empty `account_id` marks the movement *unprocessed* (awaiting
//! categorization). That is a normal state, not a validation error.

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_decimal};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Option<Uuid>,
    pub currency_id: Uuid,
    pub amount: Decimal,
    pub position: i32,
}

impl Movement {
    pub fn new(
        transaction_id: Uuid,
        account_id: Option<Uuid>,
        currency_id: Uuid,
        amount: Decimal,
        position: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            account_id,
            currency_id,
            amount,
            position,
        }
    }

    /// Unprocessed movements have no account yet.
    pub fn is_unprocessed(&self) -> bool {
        self.account_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub account_id: Option<String>,
    pub currency_id: String,
    /// Decimal serialized as text; summation always happens on [`Decimal`].
    pub amount: String,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: ActiveValue::Set(movement.id.to_string()),
            transaction_id: ActiveValue::Set(movement.transaction_id.to_string()),
            account_id: ActiveValue::Set(movement.account_id.map(|id| id.to_string())),
            currency_id: ActiveValue::Set(movement.currency_id.to_string()),
            amount: ActiveValue::Set(movement.amount.to_string()),
            position: ActiveValue::Set(movement.position),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let account_id = match model.account_id {
            Some(raw) => Some(
                Uuid::parse_str(&raw)
                    .map_err(|_| EngineError::InvalidMovement("invalid account id".to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidMovement("invalid movement id".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            account_id,
            currency_id: Uuid::parse_str(&model.currency_id)
                .map_err(|_| EngineError::InvalidMovement("invalid currency id".to_string()))?,
            amount: parse_decimal(&model.amount, "movement amount")?,
            position: model.position,
        })
    }
}
