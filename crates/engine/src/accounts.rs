//! Accounts: the places money lives (bank account, cash, card).
//!
//! Accounts are owner-scoped reference data with a native currency and an
//! opening balance. Names are unique per owner after NFKC + casefold
//! normalization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_decimal};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub currency_id: Uuid,
    pub opening_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: String,
        name: String,
        currency_id: Uuid,
        opening_balance: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            currency_id,
            opening_balance,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// NFKC + casefolded `name`, used for the per-owner uniqueness check.
    pub normalized_name: String,
    pub currency_id: String,
    pub opening_balance: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            user_id: ActiveValue::Set(account.user_id.clone()),
            name: ActiveValue::Set(account.name.clone()),
            normalized_name: ActiveValue::Set(crate::util::normalize_name(&account.name)),
            currency_id: ActiveValue::Set(account.currency_id.to_string()),
            opening_balance: ActiveValue::Set(account.opening_balance.to_string()),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            user_id: model.user_id,
            name: model.name,
            currency_id: Uuid::parse_str(&model.currency_id)
                .map_err(|_| EngineError::KeyNotFound("currency not exists".to_string()))?,
            opening_balance: parse_decimal(&model.opening_balance, "opening balance")?,
            created_at: model.created_at,
        })
    }
}
