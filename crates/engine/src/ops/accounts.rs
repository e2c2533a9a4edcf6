//! Account reference data.

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, CreateAccountCmd, EngineError, ResultEngine, accounts, audit::AuditAction,
    util::{normalize_name, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create an account. Names are unique per owner after normalization.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let created = with_tx!(self, |db_tx| {
            self.require_currency(&db_tx, &cmd.user_id, cmd.currency_id)
                .await?;

            let existing = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(cmd.user_id.clone()))
                .filter(accounts::Column::NormalizedName.eq(normalize_name(&name)))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "account {name} already exists"
                )));
            }

            let account = Account::new(
                cmd.user_id.clone(),
                name.clone(),
                cmd.currency_id,
                cmd.opening_balance,
                Utc::now(),
            );
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })?;

        self.audit(
            &cmd.user_id,
            "account",
            &created.id.to_string(),
            AuditAction::Created,
            &created,
        )
        .await;
        Ok(created)
    }

    pub async fn account(&self, user_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, user_id, account_id).await?;
            Account::try_from(model)
        })
    }

    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }
}
