//! Currencies: owner-scoped reference data.
//!
//! Every movement must reference one. `code` is unique per owner.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: Uuid,
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub decimal_places: i32,
}

impl Currency {
    pub fn new(user_id: String, code: String, name: String, decimal_places: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code,
            name,
            decimal_places,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub decimal_places: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Currency> for ActiveModel {
    fn from(currency: &Currency) -> Self {
        Self {
            id: ActiveValue::Set(currency.id.to_string()),
            user_id: ActiveValue::Set(currency.user_id.clone()),
            code: ActiveValue::Set(currency.code.clone()),
            name: ActiveValue::Set(currency.name.clone()),
            decimal_places: ActiveValue::Set(currency.decimal_places),
        }
    }
}

impl TryFrom<Model> for Currency {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("currency not exists".to_string()))?,
            user_id: model.user_id,
            code: model.code,
            name: model.name,
            decimal_places: model.decimal_places,
        })
    }
}
