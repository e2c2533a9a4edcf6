//! Reconciliation checkpoints and their invalidation.
//!
//! Invalidation is causal: a ledger write invalidates a checkpoint only when
//! it changes the net footprint of that checkpoint's (account, currency) pair
//! on or before the checkpoint boundary. A metadata-only edit deletes
//! nothing. The boundary is inclusive: a change dated exactly at
//! `checkpoint_at` invalidates the checkpoint.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Account, CreateCheckpointCmd, EngineError, Movement, NotificationKind,
    ReconciliationCheckpoint, ResultEngine, audit::AuditAction, checkpoints, dedup, movements,
    transactions, util::parse_decimal,
};

use super::{Engine, with_tx};

/// Per-account summary for the reconciliation screen.
#[derive(Clone, Debug, Serialize)]
pub struct AccountOverview {
    pub account: Account,
    /// Current balance in the account's native currency.
    pub balance: Decimal,
    pub latest_checkpoint: Option<ReconciliationCheckpoint>,
    pub last_transaction_at: Option<DateTime<Utc>>,
    /// Transactions touching this account that still carry an
    /// uncategorized movement.
    pub unprocessed: u64,
}

impl Engine {
    /// Create a checkpoint certifying the computed balance of
    /// (account, currency) as of `checkpoint_at`.
    pub async fn create_checkpoint(
        &self,
        cmd: CreateCheckpointCmd,
    ) -> ResultEngine<ReconciliationCheckpoint> {
        let created = with_tx!(self, |db_tx| {
            let account_model = self
                .require_account(&db_tx, &cmd.user_id, cmd.account_id)
                .await?;
            self.require_currency(&db_tx, &cmd.user_id, cmd.currency_id)
                .await?;
            let account = Account::try_from(account_model)?;

            let balance = self
                .balance_as_of(
                    &db_tx,
                    &cmd.user_id,
                    &account,
                    cmd.currency_id,
                    Some(cmd.checkpoint_at),
                )
                .await?;

            let checkpoint = ReconciliationCheckpoint {
                id: Uuid::new_v4(),
                user_id: cmd.user_id.clone(),
                account_id: cmd.account_id,
                currency_id: cmd.currency_id,
                checkpoint_at: cmd.checkpoint_at,
                balance,
                expected_balance: cmd.expected_balance,
                manual: cmd.manual,
                created_at: Utc::now(),
            };
            checkpoints::ActiveModel::from(&checkpoint)
                .insert(&db_tx)
                .await?;
            Ok(checkpoint)
        })?;

        self.audit(
            &cmd.user_id,
            "checkpoint",
            &created.id.to_string(),
            AuditAction::Created,
            &created,
        )
        .await;
        Ok(created)
    }

    pub async fn delete_checkpoint(&self, user_id: &str, checkpoint_id: Uuid) -> ResultEngine<()> {
        let deleted = with_tx!(self, |db_tx| {
            let model = checkpoints::Entity::find_by_id(checkpoint_id.to_string())
                .filter(checkpoints::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("checkpoint not exists".to_string()))?;
            let checkpoint = ReconciliationCheckpoint::try_from(model)?;
            checkpoints::Entity::delete_by_id(checkpoint_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(checkpoint)
        })?;

        self.audit(
            user_id,
            "checkpoint",
            &deleted.id.to_string(),
            AuditAction::Deleted,
            &deleted,
        )
        .await;
        Ok(())
    }

    /// Checkpoints for an owner, newest first, optionally for one account.
    pub async fn list_checkpoints(
        &self,
        user_id: &str,
        account_id: Option<Uuid>,
    ) -> ResultEngine<Vec<ReconciliationCheckpoint>> {
        let mut query = checkpoints::Entity::find()
            .filter(checkpoints::Column::UserId.eq(user_id.to_string()));
        if let Some(account_id) = account_id {
            query = query.filter(checkpoints::Column::AccountId.eq(account_id.to_string()));
        }
        let models = query
            .order_by_desc(checkpoints::Column::CheckpointAt)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(ReconciliationCheckpoint::try_from)
            .collect()
    }

    /// The balance of (account, currency), optionally as of a date. The
    /// currency defaults to the account's native one.
    pub async fn account_balance(
        &self,
        user_id: &str,
        account_id: Uuid,
        currency_id: Option<Uuid>,
        as_of: Option<DateTime<Utc>>,
    ) -> ResultEngine<Decimal> {
        with_tx!(self, |db_tx| {
            let account_model = self.require_account(&db_tx, user_id, account_id).await?;
            let account = Account::try_from(account_model)?;
            let currency_id = currency_id.unwrap_or(account.currency_id);
            self.balance_as_of(&db_tx, user_id, &account, currency_id, as_of)
                .await
        })
    }

    /// Transactions that touch the account but still carry a movement
    /// without an account, with `ignore_before` cutting off history the
    /// owner has declared done.
    pub async fn unprocessed_count(
        &self,
        user_id: &str,
        account_id: Uuid,
        ignore_before: Option<DateTime<Utc>>,
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, user_id, account_id).await?;
            self.count_unprocessed(&db_tx, user_id, account_id, ignore_before)
                .await
        })
    }

    /// All accounts with balance, latest checkpoint, latest activity and
    /// the count of transactions still carrying an uncategorized movement.
    pub async fn reconciliation_overview(
        &self,
        user_id: &str,
    ) -> ResultEngine<Vec<AccountOverview>> {
        with_tx!(self, |db_tx| {
            let account_models = crate::accounts::Entity::find()
                .filter(crate::accounts::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(crate::accounts::Column::Name)
                .all(&db_tx)
                .await?;

            let mut accounts = Vec::with_capacity(account_models.len());
            for model in account_models {
                let account = Account::try_from(model)?;
                let balance = self
                    .balance_as_of(&db_tx, user_id, &account, account.currency_id, None)
                    .await?;

                let latest_checkpoint = checkpoints::Entity::find()
                    .filter(checkpoints::Column::UserId.eq(user_id.to_string()))
                    .filter(checkpoints::Column::AccountId.eq(account.id.to_string()))
                    .order_by_desc(checkpoints::Column::CheckpointAt)
                    .one(&db_tx)
                    .await?
                    .map(ReconciliationCheckpoint::try_from)
                    .transpose()?;

                let last_transaction_at = transactions::Entity::find()
                    .filter(transactions::Column::UserId.eq(user_id.to_string()))
                    .filter(transactions::Column::DeletedAt.is_null())
                    .join(JoinType::InnerJoin, transactions::Relation::Movements.def())
                    .filter(movements::Column::AccountId.eq(account.id.to_string()))
                    .order_by_desc(transactions::Column::Date)
                    .one(&db_tx)
                    .await?
                    .map(|m| m.date);

                let unprocessed = self
                    .count_unprocessed(&db_tx, user_id, account.id, None)
                    .await?;

                accounts.push(AccountOverview {
                    account,
                    balance,
                    latest_checkpoint,
                    last_transaction_at,
                    unprocessed,
                });
            }

            Ok(accounts)
        })
    }

    /// Live transactions with at least one non-zero movement on the account
    /// and at least one non-zero movement without any account.
    pub(crate) async fn count_unprocessed(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        account_id: Uuid,
        ignore_before: Option<DateTime<Utc>>,
    ) -> ResultEngine<u64> {
        let mut query = movements::Entity::find()
            .join(JoinType::InnerJoin, movements::Relation::Transactions.def())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::DeletedAt.is_null());
        if let Some(cutoff) = ignore_before {
            query = query.filter(transactions::Column::Date.gte(cutoff));
        }
        let models = query.all(db_tx).await?;

        let account_key = account_id.to_string();
        let mut by_transaction: BTreeMap<String, (bool, bool)> = BTreeMap::new();
        for model in models {
            let amount = parse_decimal(&model.amount, "movement amount")?;
            if amount.is_zero() {
                continue;
            }
            let entry = by_transaction.entry(model.transaction_id).or_default();
            match &model.account_id {
                None => entry.0 = true,
                Some(id) if *id == account_key => entry.1 = true,
                Some(_) => {}
            }
        }
        let count = by_transaction
            .values()
            .filter(|(pending, on_account)| *pending && *on_account)
            .count();
        Ok(count as u64)
    }

    /// Delete every checkpoint a ledger write has made stale.
    ///
    /// `old_movements`/`old_date` describe the state being replaced (empty
    /// slice for a create), `new_movements`/`new_date` the state being
    /// written (empty slice for a delete). Only (account, currency) pairs
    /// whose net footprint changed are touched; when the date moved, every
    /// pair on either side counts as changed and the earlier date governs.
    ///
    /// Returns the affected accounts as (id, name), deduplicated, so the
    /// caller can notify after commit.
    pub(crate) async fn invalidate_checkpoints(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        old_movements: &[Movement],
        new_movements: &[Movement],
        old_date: DateTime<Utc>,
        new_date: DateTime<Utc>,
    ) -> ResultEngine<Vec<(Uuid, String)>> {
        let old_footprint = dedup::account_footprint(old_movements);
        let new_footprint = dedup::account_footprint(new_movements);

        let mut changed: BTreeSet<(Uuid, Uuid)> = BTreeSet::new();
        if old_date != new_date {
            changed.extend(old_footprint.keys().copied());
            changed.extend(new_footprint.keys().copied());
        } else {
            for (pair, sum) in &old_footprint {
                if new_footprint.get(pair) != Some(sum) {
                    changed.insert(*pair);
                }
            }
            for pair in new_footprint.keys() {
                if !old_footprint.contains_key(pair) {
                    changed.insert(*pair);
                }
            }
        }
        if changed.is_empty() {
            return Ok(Vec::new());
        }

        let effective = old_date.min(new_date);
        let mut affected = Vec::new();
        for (account_id, currency_id) in changed {
            let deleted = checkpoints::Entity::delete_many()
                .filter(checkpoints::Column::UserId.eq(user_id.to_string()))
                .filter(checkpoints::Column::AccountId.eq(account_id.to_string()))
                .filter(checkpoints::Column::CurrencyId.eq(currency_id.to_string()))
                .filter(checkpoints::Column::CheckpointAt.gte(effective))
                .exec(db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                continue;
            }
            if affected.iter().any(|(id, _)| *id == account_id) {
                continue;
            }
            let account = self.require_account(db_tx, user_id, account_id).await?;
            affected.push((account_id, account.name));
        }
        Ok(affected)
    }

    /// One notification per account whose checkpoints were invalidated.
    pub(crate) async fn notify_invalidations(&self, user_id: &str, affected: &[(Uuid, String)]) {
        for (_, name) in affected {
            self.notify(
                user_id,
                NotificationKind::ReconciliationInvalidated,
                "Reconciliation invalidated",
                format!("a ledger change invalidated checkpoints on account \"{name}\""),
            )
            .await;
        }
    }

    /// Opening balance (when the currency is the account's native one) plus
    /// the sum of live movement amounts on the pair, dated at or before
    /// `as_of` when given.
    pub(crate) async fn balance_as_of(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        account: &Account,
        currency_id: Uuid,
        as_of: Option<DateTime<Utc>>,
    ) -> ResultEngine<Decimal> {
        let mut query = movements::Entity::find()
            .filter(movements::Column::AccountId.eq(account.id.to_string()))
            .filter(movements::Column::CurrencyId.eq(currency_id.to_string()))
            .join(JoinType::InnerJoin, movements::Relation::Transactions.def())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::DeletedAt.is_null());
        if let Some(as_of) = as_of {
            query = query.filter(transactions::Column::Date.lte(as_of));
        }
        let models = query.all(db_tx).await?;

        let mut balance = if currency_id == account.currency_id {
            account.opening_balance
        } else {
            Decimal::ZERO
        };
        for model in models {
            balance += parse_decimal(&model.amount, "movement amount")?;
        }
        Ok(balance)
    }
}
