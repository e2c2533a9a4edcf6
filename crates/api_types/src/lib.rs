//! Wire types shared between the quadra server and its clients.
//!
//! Amounts are serialized as decimal strings; binary floating point never
//! appears on the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod transaction {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct MovementNew {
        pub account_id: Option<Uuid>,
        pub currency_id: Uuid,
        /// Signed decimal amount, as a string.
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub date: DateTime<Utc>,
        pub description: String,
        pub place: Option<String>,
        pub partner: Option<String>,
        pub notes: Option<String>,
        #[serde(default)]
        pub external_ids: Vec<String>,
        pub movements: Vec<MovementNew>,
    }

    /// All fields optional; absent means unchanged. An empty string clears
    /// `place`, `partner` or `notes`. `movements`, when present, replaces
    /// the movement list wholesale.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub date: Option<DateTime<Utc>>,
        pub description: Option<String>,
        pub place: Option<String>,
        pub partner: Option<String>,
        pub notes: Option<String>,
        pub movements: Option<Vec<MovementNew>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub account_id: Option<Uuid>,
        pub only_flagged: Option<bool>,
        /// Maximum rows returned; 50 when not set.
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub id: Uuid,
        pub account_id: Option<Uuid>,
        pub currency_id: Uuid,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub date: DateTime<Utc>,
        pub description: String,
        pub place: Option<String>,
        pub partner: Option<String>,
        pub notes: Option<String>,
        pub external_ids: Vec<String>,
        pub suspicious_reasons: Vec<String>,
        pub dismissed: bool,
        pub movements: Vec<MovementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod duplicate {
    use super::*;

    /// Request body for linking or unlinking a pair.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DuplicatePairRef {
        pub first_id: Uuid,
        pub second_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DuplicatePairView {
        pub first: super::transaction::TransactionView,
        pub second: super::transaction::TransactionView,
        pub linked_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DuplicateListResponse {
        pub pairs: Vec<DuplicatePairView>,
    }

    /// Request body for resolving a linked pair by merging.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DuplicateResolve {
        pub keep_id: Uuid,
        pub discard_id: Uuid,
    }
}

pub mod archive {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MergeRequest {
        pub keep_id: Uuid,
        pub discard_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MergedTransactionView {
        /// The discarded transaction's original id.
        pub id: Uuid,
        pub merged_into: Uuid,
        pub merged_at: DateTime<Utc>,
        pub snapshot: super::transaction::TransactionView,
        pub transferred_external_ids: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArchiveListResponse {
        pub merged: Vec<MergedTransactionView>,
    }
}

pub mod checkpoint {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckpointNew {
        pub account_id: Uuid,
        pub currency_id: Uuid,
        pub checkpoint_at: DateTime<Utc>,
        pub expected_balance: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckpointView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub currency_id: Uuid,
        pub checkpoint_at: DateTime<Utc>,
        pub balance: Decimal,
        pub expected_balance: Option<Decimal>,
        pub manual: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckpointListResponse {
        pub checkpoints: Vec<CheckpointView>,
    }
}

pub mod reconciliation {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountOverviewView {
        pub account: super::account::AccountView,
        pub balance: Decimal,
        pub latest_checkpoint: Option<super::checkpoint::CheckpointView>,
        pub last_transaction_at: Option<DateTime<Utc>>,
        /// Transactions on this account still carrying an uncategorized
        /// movement.
        pub unprocessed: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OverviewResponse {
        pub accounts: Vec<AccountOverviewView>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub currency_id: Uuid,
        pub opening_balance: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub currency_id: Uuid,
        pub opening_balance: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceResponse {
        pub account_id: Uuid,
        pub balance: Decimal,
        /// Boundary the balance was computed against, when one was given.
        pub as_of: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnprocessedResponse {
        pub account_id: Uuid,
        /// Transactions on this account still carrying an uncategorized
        /// movement.
        pub unprocessed: u64,
    }
}

pub mod currency {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyNew {
        pub code: String,
        pub name: String,
        pub decimal_places: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyView {
        pub id: Uuid,
        pub code: String,
        pub name: String,
        pub decimal_places: i32,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: String,
        pub title: String,
        pub body: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationListResponse {
        pub notifications: Vec<NotificationView>,
    }
}
