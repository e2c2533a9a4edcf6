//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for quadra:
//!
//! - `users`: authentication
//! - `currencies`: owner-scoped currency reference data
//! - `accounts`: places money lives (bank, cash, card)
//! - `transactions`: ledger events with metadata
//! - `movements`: individual (account, currency, amount) legs per transaction
//! - `duplicate_links`: unordered pairs of possible-duplicate transactions
//! - `merged_transactions`: archive of merged-away transactions
//! - `reconciliation_checkpoints`: certified balances at a point in time
//! - `notifications`: per-owner event feed
//! - `audit_log`: append-only record of mutations

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Currencies {
    Table,
    Id,
    UserId,
    Code,
    Name,
    DecimalPlaces,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Name,
    NormalizedName,
    CurrencyId,
    OpeningBalance,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Date,
    Description,
    Place,
    Partner,
    Notes,
    ExternalIds,
    SuspiciousReasons,
    Dismissed,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    TransactionId,
    AccountId,
    CurrencyId,
    Amount,
    Position,
}

#[derive(Iden)]
enum DuplicateLinks {
    Table,
    FirstId,
    SecondId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum MergedTransactions {
    Table,
    Id,
    UserId,
    MergedInto,
    MergedAt,
    Snapshot,
    TransferredExternalIds,
}

#[derive(Iden)]
enum ReconciliationCheckpoints {
    Table,
    Id,
    UserId,
    AccountId,
    CurrencyId,
    CheckpointAt,
    Balance,
    ExpectedBalance,
    Manual,
    CreatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Body,
    CreatedAt,
}

#[derive(Iden)]
enum AuditLog {
    Table,
    Id,
    UserId,
    EntityType,
    EntityId,
    Action,
    Snapshot,
    RecordedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Currencies
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Currencies::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Currencies::UserId).string().not_null())
                    .col(ColumnDef::new(Currencies::Code).string().not_null())
                    .col(ColumnDef::new(Currencies::Name).string().not_null())
                    .col(
                        ColumnDef::new(Currencies::DecimalPlaces)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-currencies-user_id")
                            .from(Currencies::Table, Currencies::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-currencies-user_id-code-unique")
                    .table(Currencies::Table)
                    .col(Currencies::UserId)
                    .col(Currencies::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::UserId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::NormalizedName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::CurrencyId).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::OpeningBalance)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-user_id")
                            .from(Accounts::Table, Accounts::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-currency_id")
                            .from(Accounts::Table, Accounts::CurrencyId)
                            .to(Currencies::Table, Currencies::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-normalized_name-unique")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::NormalizedName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .col(ColumnDef::new(Transactions::Date).timestamp().not_null())
                    .col(
                        ColumnDef::new(Transactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Place).string())
                    .col(ColumnDef::new(Transactions::Partner).string())
                    .col(ColumnDef::new(Transactions::Notes).string())
                    .col(
                        ColumnDef::new(Transactions::ExternalIds)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Transactions::SuspiciousReasons)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Transactions::Dismissed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::DeletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-date")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-user_id-deleted_at")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::DeletedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Movements::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::AccountId).string())
                    .col(ColumnDef::new(Movements::CurrencyId).string().not_null())
                    .col(ColumnDef::new(Movements::Amount).string().not_null())
                    .col(ColumnDef::new(Movements::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-transaction_id")
                            .from(Movements::Table, Movements::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-transaction_id")
                    .table(Movements::Table)
                    .col(Movements::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-account_id")
                    .table(Movements::Table)
                    .col(Movements::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Duplicate links
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DuplicateLinks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DuplicateLinks::FirstId).string().not_null())
                    .col(
                        ColumnDef::new(DuplicateLinks::SecondId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DuplicateLinks::UserId).string().not_null())
                    .col(
                        ColumnDef::new(DuplicateLinks::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DuplicateLinks::FirstId)
                            .col(DuplicateLinks::SecondId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-duplicate_links-second_id")
                    .table(DuplicateLinks::Table)
                    .col(DuplicateLinks::SecondId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-duplicate_links-user_id")
                    .table(DuplicateLinks::Table)
                    .col(DuplicateLinks::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Merged transactions (archive)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MergedTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MergedTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MergedTransactions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MergedTransactions::MergedInto)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MergedTransactions::MergedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MergedTransactions::Snapshot)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MergedTransactions::TransferredExternalIds)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-merged_transactions-user_id")
                    .table(MergedTransactions::Table)
                    .col(MergedTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Reconciliation checkpoints
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ReconciliationCheckpoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::CurrencyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::CheckpointAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::Balance)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReconciliationCheckpoints::ExpectedBalance).string())
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::Manual)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReconciliationCheckpoints::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reconciliation_checkpoints-account_id")
                            .from(
                                ReconciliationCheckpoints::Table,
                                ReconciliationCheckpoints::AccountId,
                            )
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reconciliation_checkpoints-pair-checkpoint_at")
                    .table(ReconciliationCheckpoints::Table)
                    .col(ReconciliationCheckpoints::AccountId)
                    .col(ReconciliationCheckpoints::CurrencyId)
                    .col(ReconciliationCheckpoints::CheckpointAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).string().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Body).string().not_null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-created_at")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Audit log
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLog::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::UserId).string().not_null())
                    .col(ColumnDef::new(AuditLog::EntityType).string().not_null())
                    .col(ColumnDef::new(AuditLog::EntityId).string().not_null())
                    .col(ColumnDef::new(AuditLog::Action).string().not_null())
                    .col(ColumnDef::new(AuditLog::Snapshot).string().not_null())
                    .col(ColumnDef::new(AuditLog::RecordedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_log-user_id-recorded_at")
                    .table(AuditLog::Table)
                    .col(AuditLog::UserId)
                    .col(AuditLog::RecordedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(ReconciliationCheckpoints::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(MergedTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DuplicateLinks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
