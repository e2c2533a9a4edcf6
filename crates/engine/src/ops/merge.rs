//! Merge, unmerge and the merged-transaction archive.
//!
//! Merging keeps one transaction of a duplicate pair and hard-deletes the
//! other, after writing its full state to the archive. The archive row
//! records exactly which external ids moved onto the survivor, so unmerge
//! can take them back and recreate the discarded row as it was.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MergedTransaction, ResultEngine, SuspiciousReason, Transaction,
    audit::AuditAction, duplicate_links::canonical_pair, merged_transactions, movements,
    transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Merge `discard_id` into `keep_id`.
    ///
    /// The survivor gains the discarded row's external ids (minus ones it
    /// already had) and loses its duplicate-candidate tag. The discarded row
    /// and its movements are removed from the live tables; its full state
    /// goes to the archive. Works on any pair, linked or not.
    pub async fn merge_transactions(
        &self,
        user_id: &str,
        keep_id: Uuid,
        discard_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let (kept, archived, invalidated) = with_tx!(self, |db_tx| {
            self.merge_in_tx(&db_tx, user_id, keep_id, discard_id).await
        })?;

        self.audit(
            user_id,
            "transaction",
            &archived.id.to_string(),
            AuditAction::Merged,
            &archived,
        )
        .await;
        self.notify_invalidations(user_id, &invalidated).await;
        Ok(kept)
    }

    /// Merge a *linked* pair, keeping `keep_id`.
    ///
    /// The review-surface path: refuses pairs the graph does not hold, so a
    /// stale client cannot archive an unrelated transaction.
    pub async fn delete_duplicate_transaction(
        &self,
        user_id: &str,
        keep_id: Uuid,
        discard_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let (kept, archived, invalidated) = with_tx!(self, |db_tx| {
            let (first, second) = canonical_pair(keep_id, discard_id);
            let linked = crate::duplicate_links::Entity::find_by_id((
                first.to_string(),
                second.to_string(),
            ))
            .filter(crate::duplicate_links::Column::UserId.eq(user_id.to_string()))
            .one(&db_tx)
            .await?
            .is_some();
            if !linked {
                return Err(EngineError::Conflict(
                    "transactions are not linked as duplicates".to_string(),
                ));
            }
            self.merge_in_tx(&db_tx, user_id, keep_id, discard_id).await
        })?;

        self.audit(
            user_id,
            "transaction",
            &archived.id.to_string(),
            AuditAction::Merged,
            &archived,
        )
        .await;
        self.notify_invalidations(user_id, &invalidated).await;
        Ok(kept)
    }

    /// Reverse a merge: recreate the discarded transaction from its archive
    /// snapshot and take the transferred external ids back off the survivor.
    ///
    /// The restored row comes back without links and without the
    /// duplicate-candidate tag; the next scan pass may re-link it.
    pub async fn unmerge_transaction(
        &self,
        user_id: &str,
        discard_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let (restored, invalidated) = with_tx!(self, |db_tx| {
            let model = merged_transactions::Entity::find_by_id(discard_id.to_string())
                .filter(merged_transactions::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("archive entry not exists".to_string()))?;
            let archived = MergedTransaction::try_from(model)?;

            // The survivor may itself have been deleted since the merge; the
            // restore still goes through, there is just nothing to give back.
            match self
                .load_transaction(&db_tx, user_id, archived.merged_into)
                .await
            {
                Ok(keep) => {
                    let remaining: Vec<String> = keep
                        .external_ids
                        .iter()
                        .filter(|id| !archived.transferred_external_ids.contains(id))
                        .cloned()
                        .collect();
                    if remaining != keep.external_ids {
                        let active = transactions::ActiveModel {
                            id: ActiveValue::Set(keep.id.to_string()),
                            external_ids: ActiveValue::Set(transactions::encode_external_ids(
                                &remaining,
                            )),
                            updated_at: ActiveValue::Set(Utc::now()),
                            ..Default::default()
                        };
                        active.update(&db_tx).await?;
                    }
                }
                Err(EngineError::KeyNotFound(_)) => {}
                Err(err) => return Err(err),
            }

            let mut restored = archived.snapshot.clone();
            restored
                .suspicious_reasons
                .retain(|r| *r != SuspiciousReason::DuplicateCandidate);
            transactions::ActiveModel::from(&restored)
                .insert(&db_tx)
                .await?;
            for movement in &restored.movements {
                movements::ActiveModel::from(movement).insert(&db_tx).await?;
            }

            let invalidated = self
                .invalidate_checkpoints(
                    &db_tx,
                    user_id,
                    &[],
                    &restored.movements,
                    restored.date,
                    restored.date,
                )
                .await?;

            merged_transactions::Entity::delete_by_id(discard_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok((restored, invalidated))
        })?;

        self.audit(
            user_id,
            "transaction",
            &restored.id.to_string(),
            AuditAction::Unmerged,
            &restored,
        )
        .await;
        self.notify_invalidations(user_id, &invalidated).await;
        Ok(restored)
    }

    /// Archive entries for an owner, newest merge first.
    pub async fn list_merged_transactions(
        &self,
        user_id: &str,
    ) -> ResultEngine<Vec<MergedTransaction>> {
        let models = merged_transactions::Entity::find()
            .filter(merged_transactions::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(merged_transactions::Column::MergedAt)
            .all(&self.database)
            .await?;
        models
            .into_iter()
            .map(MergedTransaction::try_from)
            .collect()
    }

    async fn merge_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        keep_id: Uuid,
        discard_id: Uuid,
    ) -> ResultEngine<(Transaction, MergedTransaction, Vec<(Uuid, String)>)> {
        if keep_id == discard_id {
            return Err(EngineError::InvalidInput(
                "cannot merge a transaction into itself".to_string(),
            ));
        }
        let keep = self.load_transaction(db_tx, user_id, keep_id).await?;
        let discard = self.load_transaction(db_tx, user_id, discard_id).await?;

        let transferred: Vec<String> = discard
            .external_ids
            .iter()
            .filter(|id| !keep.external_ids.contains(id))
            .cloned()
            .collect();

        let archived = MergedTransaction {
            id: discard.id,
            user_id: user_id.to_string(),
            merged_into: keep.id,
            merged_at: Utc::now(),
            snapshot: discard.clone(),
            transferred_external_ids: transferred.clone(),
        };
        merged_transactions::ActiveModel::try_from(&archived)?
            .insert(db_tx)
            .await?;

        // The discard goes away for real; the archive row is its only trace.
        movements::Entity::delete_many()
            .filter(movements::Column::TransactionId.eq(discard.id.to_string()))
            .exec(db_tx)
            .await?;
        transactions::Entity::delete_by_id(discard.id.to_string())
            .exec(db_tx)
            .await?;

        let mut external_ids = keep.external_ids.clone();
        external_ids.extend(transferred);
        let mut reasons = keep.suspicious_reasons.clone();
        reasons.retain(|r| *r != SuspiciousReason::DuplicateCandidate);
        let active = transactions::ActiveModel {
            id: ActiveValue::Set(keep.id.to_string()),
            external_ids: ActiveValue::Set(transactions::encode_external_ids(&external_ids)),
            suspicious_reasons: ActiveValue::Set(transactions::encode_reasons(&reasons)),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        active.update(db_tx).await?;

        // Both sides are resolved; drop their edges and let the resync keep
        // flags honest for any third transactions that were linked to them.
        self.clear_links(db_tx, user_id, discard.id).await?;
        self.clear_links(db_tx, user_id, keep.id).await?;

        let invalidated = self
            .invalidate_checkpoints(
                db_tx,
                user_id,
                &discard.movements,
                &[],
                discard.date,
                discard.date,
            )
            .await?;

        let kept = self.load_transaction(db_tx, user_id, keep_id).await?;
        Ok((kept, archived, invalidated))
    }
}
