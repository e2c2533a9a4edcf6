//! The duplicate-link graph.
//!
//! Owns the symmetric "is possible duplicate of" relation and keeps each
//! transaction's `duplicate_candidate` tag consistent with it. The core
//! contract, preserved by every operation here and by every transaction
//! write elsewhere: a transaction carries the tag **iff** it has at least
//! one link.
//!
//! Link and unlink run inside the caller's unit of work. Flag resync is a
//! best-effort secondary effect: a resync failure is logged and swallowed,
//! and the next revalidation pass heals it.

use chrono::Utc;
use sea_orm::{ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    DuplicateLink, EngineError, ResultEngine, SuspiciousReason, Transaction, audit::AuditAction,
    dedup, duplicate_links, duplicate_links::canonical_pair, transactions,
};

use super::{Engine, with_tx};

/// A flagged pair with both endpoints loaded, for review surfaces.
#[derive(Clone, Debug, Serialize)]
pub struct DuplicatePair {
    pub first: Transaction,
    pub second: Transaction,
    pub linked_at: chrono::DateTime<Utc>,
}

fn touching(id: Uuid) -> Condition {
    Condition::any()
        .add(duplicate_links::Column::FirstId.eq(id.to_string()))
        .add(duplicate_links::Column::SecondId.eq(id.to_string()))
}

impl Engine {
    /// Flag two transactions as possible duplicates of one another.
    ///
    /// Idempotent: linking an already-linked pair is a no-op.
    pub async fn link_duplicates(&self, user_id: &str, a: Uuid, b: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            // Both endpoints must exist, be live and belong to this owner.
            self.require_transaction(&db_tx, user_id, a).await?;
            self.require_transaction(&db_tx, user_id, b).await?;
            self.insert_link(&db_tx, user_id, a, b).await?;
            self.resync_suspicion_best_effort(&db_tx, user_id, &[a, b])
                .await;
            Ok(())
        })
    }

    /// Remove the link between two transactions.
    pub async fn unlink_duplicates(&self, user_id: &str, a: Uuid, b: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.remove_link(&db_tx, user_id, a, b).await?;
            self.resync_suspicion_best_effort(&db_tx, user_id, &[a, b])
                .await;
            Ok(())
        })
    }

    /// Record "this is not a duplicate": sets the dismissed flag and clears
    /// every link touching the transaction. Dismissed transactions are
    /// skipped by future scan passes.
    pub async fn dismiss_duplicate(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<Transaction> {
        let updated = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let active = transactions::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                dismissed: ActiveValue::Set(true),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            self.clear_links(&db_tx, user_id, transaction_id).await?;
            self.load_transaction(&db_tx, user_id, transaction_id).await
        })?;

        self.audit(
            user_id,
            "transaction",
            &updated.id.to_string(),
            AuditAction::Updated,
            &updated,
        )
        .await;
        Ok(updated)
    }

    /// The currently flagged pairs for an owner, both endpoints loaded.
    pub async fn list_duplicate_pairs(&self, user_id: &str) -> ResultEngine<Vec<DuplicatePair>> {
        with_tx!(self, |db_tx| {
            let links = duplicate_links::Entity::find()
                .filter(duplicate_links::Column::UserId.eq(user_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut pairs = Vec::with_capacity(links.len());
            for model in links {
                let link = DuplicateLink::try_from(model)?;
                let first = self.load_transaction(&db_tx, user_id, link.first_id).await?;
                let second = self
                    .load_transaction(&db_tx, user_id, link.second_id)
                    .await?;
                pairs.push(DuplicatePair {
                    first,
                    second,
                    linked_at: link.created_at,
                });
            }
            Ok(pairs)
        })
    }

    /// One duplicate-scan pass over an owner's recent transactions.
    ///
    /// Considers live, non-dismissed transactions dated within the window.
    /// Only cross-source pairs are linked automatically: both sides must
    /// carry external ids and the id sets must be disjoint (a shared id
    /// means the same import saw the same row twice, which the importer
    /// already deduplicates). Returns the number of new links created.
    pub async fn scan_owner_for_duplicates(
        &self,
        user_id: &str,
        window_days: i64,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let window_start = Utc::now() - chrono::Duration::days(window_days);
            let candidates = self.scan_candidates(&db_tx, user_id, window_start).await?;

            let mut new_links = 0;
            let mut touched: Vec<Uuid> = Vec::new();
            for (i, a) in candidates.iter().enumerate() {
                if a.external_ids.is_empty() {
                    continue;
                }
                for b in &candidates[i + 1..] {
                    if b.external_ids.is_empty() {
                        continue;
                    }
                    if a.external_ids.iter().any(|id| b.external_ids.contains(id)) {
                        continue;
                    }
                    if !dedup::is_duplicate_of(a.date, &a.movements, b.date, &b.movements) {
                        continue;
                    }
                    if self.insert_link(&db_tx, user_id, a.id, b.id).await? {
                        new_links += 1;
                        touched.push(a.id);
                        touched.push(b.id);
                    }
                }
            }

            self.resync_suspicion_best_effort(&db_tx, user_id, &touched)
                .await;
            Ok(new_links)
        })
    }

    /// Insert the canonical pair row. Returns true when a new link was
    /// created, false when it already existed.
    pub(crate) async fn insert_link(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        a: Uuid,
        b: Uuid,
    ) -> ResultEngine<bool> {
        if a == b {
            return Err(EngineError::InvalidInput(
                "cannot link a transaction to itself".to_string(),
            ));
        }
        let (first, second) = canonical_pair(a, b);
        let existing = duplicate_links::Entity::find_by_id((first.to_string(), second.to_string()))
            .filter(duplicate_links::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let link = DuplicateLink::new(user_id.to_string(), a, b, Utc::now());
        duplicate_links::ActiveModel::from(&link).insert(db_tx).await?;
        Ok(true)
    }

    pub(crate) async fn remove_link(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        a: Uuid,
        b: Uuid,
    ) -> ResultEngine<()> {
        let (first, second) = canonical_pair(a, b);
        duplicate_links::Entity::delete_many()
            .filter(duplicate_links::Column::UserId.eq(user_id.to_string()))
            .filter(duplicate_links::Column::FirstId.eq(first.to_string()))
            .filter(duplicate_links::Column::SecondId.eq(second.to_string()))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    /// Every link touching `transaction_id`, as domain values.
    pub(crate) async fn links_touching(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<DuplicateLink>> {
        let models = duplicate_links::Entity::find()
            .filter(duplicate_links::Column::UserId.eq(user_id.to_string()))
            .filter(touching(transaction_id))
            .all(db_tx)
            .await?;
        models.into_iter().map(DuplicateLink::try_from).collect()
    }

    /// Remove every link touching `transaction_id`, then re-derive the
    /// suspicion flag for it and for every former neighbor.
    ///
    /// Used on delete, merge and dismissal.
    pub(crate) async fn clear_links(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<Uuid>> {
        let links = self.links_touching(db_tx, user_id, transaction_id).await?;
        let neighbors: Vec<Uuid> = links
            .iter()
            .filter_map(|link| link.other(transaction_id))
            .collect();

        duplicate_links::Entity::delete_many()
            .filter(duplicate_links::Column::UserId.eq(user_id.to_string()))
            .filter(touching(transaction_id))
            .exec(db_tx)
            .await?;

        let mut to_resync = neighbors.clone();
        to_resync.push(transaction_id);
        self.resync_suspicion_best_effort(db_tx, user_id, &to_resync)
            .await;
        Ok(neighbors)
    }

    /// Re-apply the duplicate predicate to the live state of
    /// `transaction_id` and each of its neighbors; drop links that no
    /// longer hold.
    ///
    /// Runs on every transaction update, inside the update's unit of work.
    pub(crate) async fn revalidate_links(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let links = self.links_touching(db_tx, user_id, transaction_id).await?;
        if links.is_empty() {
            return Ok(());
        }

        let subject = self.load_transaction(db_tx, user_id, transaction_id).await?;
        let mut touched = vec![transaction_id];

        for link in links {
            let Some(other_id) = link.other(transaction_id) else {
                continue;
            };
            let other = match self.load_transaction(db_tx, user_id, other_id).await {
                Ok(other) => other,
                // A dangling edge to a deleted row is itself stale.
                Err(EngineError::KeyNotFound(_)) => {
                    self.remove_link(db_tx, user_id, transaction_id, other_id)
                        .await?;
                    touched.push(other_id);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if !dedup::is_duplicate_of(subject.date, &subject.movements, other.date, &other.movements)
            {
                self.remove_link(db_tx, user_id, transaction_id, other_id)
                    .await?;
                touched.push(other_id);
            }
        }

        self.resync_suspicion_best_effort(db_tx, user_id, &touched)
            .await;
        Ok(())
    }

    /// Set or clear the `duplicate_candidate` tag from the live edge count
    /// alone. Idempotent; other suspicion reasons are preserved untouched.
    pub(crate) async fn sync_suspicion(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let Some(model) = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
        else {
            // Deleted or merged away; its links are cleared separately.
            return Ok(());
        };

        let has_links = !self
            .links_touching(db_tx, user_id, transaction_id)
            .await?
            .is_empty();

        let mut reasons = transactions::decode_reasons(&model.suspicious_reasons)?;
        let tagged = reasons.contains(&SuspiciousReason::DuplicateCandidate);
        if has_links == tagged {
            return Ok(());
        }
        if has_links {
            reasons.push(SuspiciousReason::DuplicateCandidate);
        } else {
            reasons.retain(|r| *r != SuspiciousReason::DuplicateCandidate);
        }

        let active = transactions::ActiveModel {
            id: ActiveValue::Set(model.id),
            suspicious_reasons: ActiveValue::Set(transactions::encode_reasons(&reasons)),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(())
    }

    pub(crate) async fn resync_suspicion_best_effort(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        transaction_ids: &[Uuid],
    ) {
        for id in transaction_ids {
            if let Err(err) = self.sync_suspicion(db_tx, user_id, *id).await {
                tracing::warn!(user = user_id, transaction = %id, "failed to resync suspicion flag: {err}");
            }
        }
    }
}
