//! The duplicate-link relation.
//!
//! "A is a possible duplicate of B" is an undirected relation over
//! transaction ids. It is stored as a set of unordered pairs keyed by the
//! canonical `(min, max)` ordering of the two ids, so symmetry holds by
//! construction rather than by mirrored-row discipline.
//!
//! Links are ephemeral: created by the scanner or an explicit linking call,
//! destroyed by dismissal, deletion, merge, or revalidation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Order two transaction ids canonically (`first < second`).
pub(crate) fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateLink {
    pub user_id: String,
    pub first_id: Uuid,
    pub second_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DuplicateLink {
    pub fn new(user_id: String, a: Uuid, b: Uuid, created_at: DateTime<Utc>) -> Self {
        let (first_id, second_id) = canonical_pair(a, b);
        Self {
            user_id,
            first_id,
            second_id,
            created_at,
        }
    }

    /// The endpoint that is not `id`, if `id` is part of this link.
    pub fn other(&self, id: Uuid) -> Option<Uuid> {
        if self.first_id == id {
            Some(self.second_id)
        } else if self.second_id == id {
            Some(self.first_id)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "duplicate_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub first_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub second_id: String,
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DuplicateLink> for ActiveModel {
    fn from(link: &DuplicateLink) -> Self {
        Self {
            first_id: ActiveValue::Set(link.first_id.to_string()),
            second_id: ActiveValue::Set(link.second_id.to_string()),
            user_id: ActiveValue::Set(link.user_id.clone()),
            created_at: ActiveValue::Set(link.created_at),
        }
    }
}

impl TryFrom<Model> for DuplicateLink {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            first_id: Uuid::parse_str(&model.first_id)
                .map_err(|_| EngineError::InvalidInput("invalid link id".to_string()))?,
            second_id: Uuid::parse_str(&model.second_id)
                .map_err(|_| EngineError::InvalidInput("invalid link id".to_string()))?,
            user_id: model.user_id,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_orders_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        let (first, second) = canonical_pair(a, b);
        assert!(first <= second);
    }

    #[test]
    fn other_returns_opposite_endpoint() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let link = DuplicateLink::new("alice".to_string(), a, b, Utc::now());
        assert_eq!(link.other(a), Some(b));
        assert_eq!(link.other(b), Some(a));
        assert_eq!(link.other(Uuid::new_v4()), None);
    }
}
