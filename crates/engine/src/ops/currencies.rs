//! Currency reference data.

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    CreateCurrencyCmd, Currency, EngineError, ResultEngine, audit::AuditAction, currencies,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a currency. Codes are unique per owner, stored uppercase.
    pub async fn create_currency(&self, cmd: CreateCurrencyCmd) -> ResultEngine<Currency> {
        let code = normalize_required_name(&cmd.code, "currency")?.to_uppercase();
        let name = normalize_required_name(&cmd.name, "currency")?;
        if cmd.decimal_places < 0 {
            return Err(EngineError::InvalidInput(
                "decimal places cannot be negative".to_string(),
            ));
        }

        let created = with_tx!(self, |db_tx| {
            let existing = currencies::Entity::find()
                .filter(currencies::Column::UserId.eq(cmd.user_id.clone()))
                .filter(currencies::Column::Code.eq(code.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "currency {code} already exists"
                )));
            }

            let currency = Currency::new(cmd.user_id.clone(), code.clone(), name.clone(), cmd.decimal_places);
            currencies::ActiveModel::from(&currency)
                .insert(&db_tx)
                .await?;
            Ok(currency)
        })?;

        self.audit(
            &cmd.user_id,
            "currency",
            &created.id.to_string(),
            AuditAction::Created,
            &created,
        )
        .await;
        Ok(created)
    }

    pub async fn list_currencies(&self, user_id: &str) -> ResultEngine<Vec<Currency>> {
        let models = currencies::Entity::find()
            .filter(currencies::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(currencies::Column::Code)
            .all(&self.database)
            .await?;
        models.into_iter().map(Currency::try_from).collect()
    }
}
