//! Owner-scoped lookups shared by every operation.
//!
//! A row that exists but belongs to another owner reports the same message
//! as a missing row; ownership must not leak through error text.

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Movement, ResultEngine, Transaction, accounts, currencies, movements,
    transactions, users,
};

use super::Engine;

impl Engine {
    /// All known usernames; the background scanner iterates these.
    pub async fn list_usernames(&self) -> ResultEngine<Vec<String>> {
        let models = users::Entity::find().all(&self.database).await?;
        Ok(models.into_iter().map(|m| m.username).collect())
    }

    /// Load a live (non-deleted) transaction row for this owner.
    pub(crate) async fn require_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    pub(crate) async fn load_movements(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::TransactionId.eq(transaction_id.to_string()))
            .order_by_asc(movements::Column::Position)
            .all(db_tx)
            .await?;
        models.into_iter().map(Movement::try_from).collect()
    }

    /// Load a live transaction with its movements.
    pub(crate) async fn load_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = self
            .require_transaction(db_tx, user_id, transaction_id)
            .await?;
        let mut tx = Transaction::try_from(model)?;
        tx.movements = self.load_movements(db_tx, tx.id).await?;
        Ok(tx)
    }

    pub(crate) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    pub(crate) async fn require_currency(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        currency_id: Uuid,
    ) -> ResultEngine<currencies::Model> {
        currencies::Entity::find_by_id(currency_id.to_string())
            .filter(currencies::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("currency not exists".to_string()))
    }
}
