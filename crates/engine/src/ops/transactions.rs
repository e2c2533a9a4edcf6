//! Transaction writes and reads.
//!
//! Every write runs in one unit of work and finishes with the two integrity
//! side effects computed from the state that was actually persisted: duplicate
//! link revalidation and reconciliation checkpoint invalidation. Audit and
//! notification records are appended after commit, best-effort.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, Movement, MovementDraft, ResultEngine, Transaction,
    UpdateTransactionCmd, audit::AuditAction, movements, transactions,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, only transactions with a movement on this account.
    pub account_id: Option<Uuid>,
    /// If true, only transactions carrying the duplicate-candidate tag.
    pub only_flagged: bool,
    /// Maximum rows returned; 50 when not set.
    pub limit: Option<u64>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

/// `None` keeps the stored value; an empty or blank string clears it.
fn merge_text(update: Option<&str>, stored: Option<&str>) -> Option<String> {
    match update {
        None => stored.map(str::to_string),
        Some(text) => normalize_optional_text(Some(text)),
    }
}

impl Engine {
    /// Create a transaction with its movements.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let description = normalize_required_name(&cmd.description, "transaction")?;
        let (created, invalidated) = with_tx!(self, |db_tx| {
            self.validate_movements(&db_tx, &cmd.user_id, &cmd.movements)
                .await?;

            let now = Utc::now();
            let mut tx = Transaction::new(cmd.user_id.clone(), cmd.date, description.clone(), now);
            tx.place = normalize_optional_text(cmd.place.as_deref());
            tx.partner = normalize_optional_text(cmd.partner.as_deref());
            tx.notes = normalize_optional_text(cmd.notes.as_deref());
            for id in &cmd.external_ids {
                if !tx.external_ids.contains(id) {
                    tx.external_ids.push(id.clone());
                }
            }

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            tx.movements = self
                .insert_movements(&db_tx, tx.id, &cmd.movements)
                .await?;

            let invalidated = self
                .invalidate_checkpoints(&db_tx, &cmd.user_id, &[], &tx.movements, tx.date, tx.date)
                .await?;
            Ok((tx, invalidated))
        })?;

        self.audit(
            &cmd.user_id,
            "transaction",
            &created.id.to_string(),
            AuditAction::Created,
            &created,
        )
        .await;
        self.notify_invalidations(&cmd.user_id, &invalidated).await;
        Ok(created)
    }

    /// Update a transaction (user path).
    ///
    /// Date, description, place, partner, notes and movements may change.
    /// For place, partner and notes an absent field keeps the stored value
    /// and an empty string clears it. External ids, suspicion tags and the
    /// dismissed flag are preserved from the stored row no matter what the
    /// caller sends.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        let (updated, invalidated) = with_tx!(self, |db_tx| {
            let stored = self
                .load_transaction(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;

            let new_date = cmd.date.unwrap_or(stored.date);
            let new_movements = match &cmd.movements {
                Some(drafts) => {
                    self.validate_movements(&db_tx, &cmd.user_id, drafts).await?;
                    movements::Entity::delete_many()
                        .filter(
                            movements::Column::TransactionId.eq(cmd.transaction_id.to_string()),
                        )
                        .exec(&db_tx)
                        .await?;
                    self.insert_movements(&db_tx, cmd.transaction_id, drafts)
                        .await?
                }
                None => stored.movements.clone(),
            };

            let description = match &cmd.description {
                Some(description) => normalize_required_name(description, "transaction")?,
                None => stored.description.clone(),
            };
            let active = transactions::ActiveModel {
                id: ActiveValue::Set(stored.id.to_string()),
                date: ActiveValue::Set(new_date),
                description: ActiveValue::Set(description),
                place: ActiveValue::Set(merge_text(cmd.place.as_deref(), stored.place.as_deref())),
                partner: ActiveValue::Set(merge_text(
                    cmd.partner.as_deref(),
                    stored.partner.as_deref(),
                )),
                notes: ActiveValue::Set(merge_text(cmd.notes.as_deref(), stored.notes.as_deref())),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            let invalidated = self
                .invalidate_checkpoints(
                    &db_tx,
                    &cmd.user_id,
                    &stored.movements,
                    &new_movements,
                    stored.date,
                    new_date,
                )
                .await?;

            // The edit may have broken (or kept) existing duplicate matches.
            self.revalidate_links(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;

            let updated = self
                .load_transaction(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;
            Ok((updated, invalidated))
        })?;

        self.audit(
            &cmd.user_id,
            "transaction",
            &updated.id.to_string(),
            AuditAction::Updated,
            &updated,
        )
        .await;
        self.notify_invalidations(&cmd.user_id, &invalidated).await;
        Ok(updated)
    }

    /// Soft-delete a transaction.
    ///
    /// Conflict if the row carries external identifiers: imported rows can
    /// only disappear by being merged. Clears any duplicate links the row
    /// held and invalidates the checkpoints its removal affects.
    pub async fn delete_transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<()> {
        let (deleted, invalidated) = with_tx!(self, |db_tx| {
            let stored = self
                .load_transaction(&db_tx, user_id, transaction_id)
                .await?;
            if !stored.external_ids.is_empty() {
                return Err(EngineError::Conflict(format!(
                    "transaction carries external identifiers: {}",
                    stored.external_ids.join(", ")
                )));
            }

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(stored.id.to_string()),
                deleted_at: ActiveValue::Set(Some(Utc::now())),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            self.clear_links(&db_tx, user_id, transaction_id).await?;
            let invalidated = self
                .invalidate_checkpoints(
                    &db_tx,
                    user_id,
                    &stored.movements,
                    &[],
                    stored.date,
                    stored.date,
                )
                .await?;
            Ok((stored, invalidated))
        })?;

        self.audit(
            user_id,
            "transaction",
            &deleted.id.to_string(),
            AuditAction::Deleted,
            &deleted,
        )
        .await;
        self.notify_invalidations(user_id, &invalidated).await;
        Ok(())
    }

    /// Return a live transaction with its movements.
    pub async fn transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.load_transaction(&db_tx, user_id, transaction_id).await
        })
    }

    /// List live transactions, newest first.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .filter(transactions::Column::DeletedAt.is_null());

            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::Date.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::Date.lt(to));
            }
            if let Some(account_id) = filter.account_id {
                query = query
                    .join(JoinType::InnerJoin, transactions::Relation::Movements.def())
                    .filter(movements::Column::AccountId.eq(account_id.to_string()))
                    .distinct();
            }
            if filter.only_flagged {
                query = query
                    .filter(transactions::Column::SuspiciousReasons.contains("duplicate_candidate"));
            }

            let models = query
                .order_by_desc(transactions::Column::Date)
                .limit(filter.limit.unwrap_or(50))
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let mut tx = Transaction::try_from(model)?;
                tx.movements = self.load_movements(&db_tx, tx.id).await?;
                out.push(tx);
            }
            Ok(out)
        })
    }

    /// Live, non-dismissed transactions dated within `[window_start, now]`,
    /// movements loaded. Feed for the duplicate scanner.
    pub(crate) async fn scan_candidates(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        window_start: DateTime<Utc>,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::DeletedAt.is_null())
            .filter(transactions::Column::Dismissed.eq(false))
            .filter(transactions::Column::Date.gte(window_start))
            .order_by_asc(transactions::Column::Date)
            .all(db_tx)
            .await?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let mut tx = Transaction::try_from(model)?;
            tx.movements = self.load_movements(db_tx, tx.id).await?;
            out.push(tx);
        }
        Ok(out)
    }

    /// A movement's currency must exist; its account, when set, must exist.
    /// An empty account is the *unprocessed* state, not an error.
    pub(crate) async fn validate_movements(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        drafts: &[MovementDraft],
    ) -> ResultEngine<()> {
        if drafts.is_empty() {
            return Err(EngineError::InvalidMovement(
                "transaction must have at least one movement".to_string(),
            ));
        }
        for (position, draft) in drafts.iter().enumerate() {
            if self
                .require_currency(db_tx, user_id, draft.currency_id)
                .await
                .is_err()
            {
                return Err(EngineError::InvalidMovement(format!(
                    "movement {position}: currency {} not exists",
                    draft.currency_id
                )));
            }
            if let Some(account_id) = draft.account_id
                && self
                    .require_account(db_tx, user_id, account_id)
                    .await
                    .is_err()
            {
                return Err(EngineError::InvalidMovement(format!(
                    "movement {position}: account {account_id} not exists"
                )));
            }
        }
        Ok(())
    }

    pub(crate) async fn insert_movements(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        drafts: &[MovementDraft],
    ) -> ResultEngine<Vec<Movement>> {
        let mut out = Vec::with_capacity(drafts.len());
        for (position, draft) in drafts.iter().enumerate() {
            let movement = Movement::new(
                transaction_id,
                draft.account_id,
                draft.currency_id,
                draft.amount,
                position as i32,
            );
            movements::ActiveModel::from(&movement).insert(db_tx).await?;
            out.push(movement);
        }
        Ok(out)
    }
}
