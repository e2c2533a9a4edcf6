//! Transaction integrity engine for the quadra personal-finance ledger.
//!
//! The engine owns the mutable transaction ledger and keeps it consistent
//! under three competing forces: automated bank imports that can introduce
//! duplicates, user edits that can retroactively change certified amounts,
//! and the requirement that merged transactions are never truly lost.
//!
//! Everything is owner-scoped; no operation crosses owners. Every multi-step
//! mutation runs inside one database transaction obtained at the engine
//! boundary.

pub use accounts::Account;
pub use audit::AuditAction;
pub use checkpoints::ReconciliationCheckpoint;
pub use commands::{
    CreateAccountCmd, CreateCheckpointCmd, CreateCurrencyCmd, CreateTransactionCmd, MovementDraft,
    UpdateTransactionCmd,
};
pub use currencies::Currency;
pub use dedup::{DATE_TOLERANCE_DAYS, is_duplicate_of};
pub use duplicate_links::DuplicateLink;
pub use error::EngineError;
pub use merged_transactions::MergedTransaction;
pub use movements::Movement;
pub use notifications::{Notification, NotificationKind};
pub use ops::{AccountOverview, DuplicatePair, Engine, EngineBuilder, TransactionListFilter};
pub use scanner::{DuplicateScanner, ScannerConfig};
pub use transactions::{SuspiciousReason, Transaction};

mod accounts;
mod audit;
mod checkpoints;
mod commands;
mod currencies;
mod dedup;
mod duplicate_links;
mod error;
mod merged_transactions;
mod movements;
mod notifications;
mod ops;
mod scanner;
mod transactions;
mod users;
mod util;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
