use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateAccountCmd, CreateCheckpointCmd, CreateCurrencyCmd, CreateTransactionCmd, Engine,
    MovementDraft, NotificationKind, Transaction, UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec!["alice".into(), "password".into()],
    ))
    .await
    .unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, d, 12, 0, 0).unwrap()
}

fn amount(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

async fn setup_refs(engine: &Engine, opening: &str) -> (Uuid, Uuid) {
    let currency = engine
        .create_currency(CreateCurrencyCmd::new("alice", "EUR", "Euro"))
        .await
        .unwrap();
    let account = engine
        .create_account(
            CreateAccountCmd::new("alice", "Bank", currency.id).opening_balance(amount(opening)),
        )
        .await
        .unwrap();
    (currency.id, account.id)
}

async fn new_tx(
    engine: &Engine,
    date: DateTime<Utc>,
    account: Uuid,
    currency: Uuid,
    value: &str,
) -> Transaction {
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", date, "rent")
                .movement(MovementDraft::new(currency, amount(value)).account_id(account)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn checkpoint_certifies_the_computed_balance() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "100.00").await;

    new_tx(&engine, day(1), account, currency, "-25.00").await;
    new_tx(&engine, day(10), account, currency, "-10.00").await;

    let checkpoint = engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    // Only the day-1 movement falls inside the boundary.
    assert_eq!(checkpoint.balance, amount("75.00"));
}

#[tokio::test]
async fn creating_an_earlier_transaction_invalidates_the_checkpoint() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    new_tx(&engine, day(1), account, currency, "-25.00").await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    new_tx(&engine, day(3), account, currency, "-5.00").await;

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());

    let notifications = engine.list_notifications("alice", 10).await.unwrap();
    assert!(
        notifications
            .iter()
            .any(|n| n.kind == NotificationKind::ReconciliationInvalidated)
    );
}

#[tokio::test]
async fn a_change_dated_exactly_at_the_boundary_invalidates() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    new_tx(&engine, day(5), account, currency, "-5.00").await;

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn later_transactions_leave_the_checkpoint_alone() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    new_tx(&engine, day(10), account, currency, "-5.00").await;

    assert_eq!(engine.list_checkpoints("alice", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn metadata_only_edits_never_invalidate() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let tx = new_tx(&engine, day(1), account, currency, "-25.00").await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .description("rent, march")
                .notes("paid late"),
        )
        .await
        .unwrap();

    assert_eq!(engine.list_checkpoints("alice", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn amount_changes_invalidate_covering_checkpoints() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let tx = new_tx(&engine, day(1), account, currency, "-25.00").await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .movements(vec![MovementDraft::new(currency, amount("-26.00")).account_id(account)]),
        )
        .await
        .unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn moving_a_date_invalidates_from_the_earlier_date() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let tx = new_tx(&engine, day(10), account, currency, "-25.00").await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    // The move from day 10 to day 2 crosses the boundary; the footprint is
    // unchanged but the dates differ, so the day-2 side governs.
    engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).date(day(2)))
        .await
        .unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn unrelated_accounts_keep_their_checkpoints() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;
    let other = engine
        .create_account(CreateAccountCmd::new("alice", "Cash", currency))
        .await
        .unwrap();

    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", other.id, currency, day(5)))
        .await
        .unwrap();

    new_tx(&engine, day(1), account, currency, "-25.00").await;

    assert_eq!(
        engine
            .list_checkpoints("alice", Some(other.id))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn deleting_a_transaction_invalidates_covering_checkpoints() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let tx = new_tx(&engine, day(1), account, currency, "-25.00").await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    engine.delete_transaction("alice", tx.id).await.unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn balance_honors_the_as_of_boundary_and_soft_deletes() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "100.00").await;

    new_tx(&engine, day(1), account, currency, "-25.00").await;
    let gone = new_tx(&engine, day(2), account, currency, "-40.00").await;
    new_tx(&engine, day(10), account, currency, "-10.00").await;
    engine.delete_transaction("alice", gone.id).await.unwrap();

    let as_of_day_5 = engine
        .account_balance("alice", account, Some(currency), Some(day(5)))
        .await
        .unwrap();
    assert_eq!(as_of_day_5, amount("75.00"));

    // No currency given: the account's native currency applies.
    let current = engine
        .account_balance("alice", account, None, None)
        .await
        .unwrap();
    assert_eq!(current, amount("65.00"));
}

#[tokio::test]
async fn overview_reports_balances_checkpoints_and_unprocessed_transactions() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "100.00").await;

    new_tx(&engine, day(1), account, currency, "-25.00").await;
    // A withdrawal taken from the bank but not yet categorized: the account
    // side is known, the other side is not.
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", day(2), "atm withdrawal")
                .movement(MovementDraft::new(currency, amount("-9.99")).account_id(account))
                .movement(MovementDraft::new(currency, amount("9.99"))),
        )
        .await
        .unwrap();
    let checkpoint = engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    let overview = engine.reconciliation_overview("alice").await.unwrap();
    assert_eq!(overview.len(), 1);

    let entry = &overview[0];
    assert_eq!(entry.account.id, account);
    assert_eq!(entry.balance, amount("65.01"));
    assert_eq!(entry.last_transaction_at, Some(day(2)));
    assert_eq!(entry.unprocessed, 1);
    assert_eq!(
        entry.latest_checkpoint.as_ref().map(|c| c.id),
        Some(checkpoint.id)
    );
}

#[tokio::test]
async fn unprocessed_count_requires_a_movement_on_the_account() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    // Fully uncategorized: neither movement names an account, so no account
    // can claim this transaction as its pending work.
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", day(2), "unknown card charge")
                .movement(MovementDraft::new(currency, amount("-9.99")))
                .movement(MovementDraft::new(currency, amount("9.99"))),
        )
        .await
        .unwrap();

    let count = engine
        .unprocessed_count("alice", account, None)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn unprocessed_count_sees_mixed_transactions_and_skips_settled_ones() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    // Fully categorized: nothing pending.
    new_tx(&engine, day(1), account, currency, "-25.00").await;
    // Account side known, counterpart not: pending for this account.
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", day(2), "atm withdrawal")
                .movement(MovementDraft::new(currency, amount("-50.00")).account_id(account))
                .movement(MovementDraft::new(currency, amount("50.00"))),
        )
        .await
        .unwrap();

    let count = engine
        .unprocessed_count("alice", account, None)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unprocessed_count_honors_the_ignore_before_cutoff() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    for d in [1, 10] {
        engine
            .create_transaction(
                CreateTransactionCmd::new("alice", day(d), "atm withdrawal")
                    .movement(MovementDraft::new(currency, amount("-50.00")).account_id(account))
                    .movement(MovementDraft::new(currency, amount("50.00"))),
            )
            .await
            .unwrap();
    }

    let all = engine
        .unprocessed_count("alice", account, None)
        .await
        .unwrap();
    assert_eq!(all, 2);

    let recent = engine
        .unprocessed_count("alice", account, Some(day(5)))
        .await
        .unwrap();
    assert_eq!(recent, 1);
}

#[tokio::test]
async fn unprocessed_count_ignores_deleted_transactions() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new("alice", day(2), "atm withdrawal")
                .movement(MovementDraft::new(currency, amount("-50.00")).account_id(account))
                .movement(MovementDraft::new(currency, amount("50.00"))),
        )
        .await
        .unwrap();
    engine.delete_transaction("alice", tx.id).await.unwrap();

    let count = engine
        .unprocessed_count("alice", account, None)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn deleting_a_checkpoint_by_hand() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "0").await;

    let checkpoint = engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();
    engine
        .delete_checkpoint("alice", checkpoint.id)
        .await
        .unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}
