use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateAccountCmd, CreateCheckpointCmd, CreateCurrencyCmd, CreateTransactionCmd, Engine,
    EngineError, MovementDraft, SuspiciousReason, Transaction,
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

async fn setup_refs(engine: &Engine) -> (Uuid, Uuid) {
    let currency = engine
        .create_currency(CreateCurrencyCmd::new("alice", "EUR", "Euro"))
        .await
        .unwrap();
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "Bank", currency.id))
        .await
        .unwrap();
    (currency.id, account.id)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, d, 12, 0, 0).unwrap()
}

fn amount(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

async fn new_tx(
    engine: &Engine,
    date: DateTime<Utc>,
    account: Uuid,
    currency: Uuid,
    value: &str,
    external_ids: &[&str],
) -> Transaction {
    let mut cmd = CreateTransactionCmd::new("alice", date, "card payment")
        .movement(MovementDraft::new(currency, amount(value)).account_id(account));
    for id in external_ids {
        cmd = cmd.external_id(*id);
    }
    engine.create_transaction(cmd).await.unwrap()
}

#[tokio::test]
async fn merge_transfers_external_ids_and_archives_the_discard() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &["bank:1"]).await;
    let discard = new_tx(&engine, day(1), account, currency, "-60.00", &["csv:9"]).await;
    engine
        .link_duplicates("alice", keep.id, discard.id)
        .await
        .unwrap();

    let kept = engine
        .merge_transactions("alice", keep.id, discard.id)
        .await
        .unwrap();

    assert_eq!(kept.external_ids, vec!["bank:1", "csv:9"]);
    assert!(!kept.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());

    let err = engine.transaction("alice", discard.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));

    let archive = engine.list_merged_transactions("alice").await.unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].id, discard.id);
    assert_eq!(archive[0].merged_into, keep.id);
    assert_eq!(archive[0].transferred_external_ids, vec!["csv:9"]);
    assert_eq!(archive[0].snapshot.id, discard.id);
}

#[tokio::test]
async fn merge_does_not_duplicate_shared_external_ids() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &["bank:1"]).await;
    let discard = new_tx(
        &engine,
        day(1),
        account,
        currency,
        "-60.00",
        &["bank:1", "csv:9"],
    )
    .await;

    let kept = engine
        .merge_transactions("alice", keep.id, discard.id)
        .await
        .unwrap();
    assert_eq!(kept.external_ids, vec!["bank:1", "csv:9"]);

    let archive = engine.list_merged_transactions("alice").await.unwrap();
    assert_eq!(archive[0].transferred_external_ids, vec!["csv:9"]);
}

#[tokio::test]
async fn unmerge_restores_the_discard_and_returns_transferred_ids() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &["bank:1"]).await;
    let discard = new_tx(&engine, day(2), account, currency, "-60.00", &["csv:9"]).await;

    engine
        .merge_transactions("alice", keep.id, discard.id)
        .await
        .unwrap();
    let restored = engine.unmerge_transaction("alice", discard.id).await.unwrap();

    assert_eq!(restored.id, discard.id);
    assert_eq!(restored.date, discard.date);
    assert_eq!(restored.description, discard.description);
    assert_eq!(restored.external_ids, vec!["csv:9"]);
    assert!(!restored.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert_eq!(restored.movements.len(), 1);
    assert_eq!(restored.movements[0].amount, amount("-60.00"));

    let kept = engine.transaction("alice", keep.id).await.unwrap();
    assert_eq!(kept.external_ids, vec!["bank:1"]);

    // Restored rows come back unlinked.
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());
    assert!(engine.list_merged_transactions("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn unmerge_without_archive_entry_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .unmerge_transaction("alice", Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("archive entry not exists".to_string()));
}

#[tokio::test]
async fn merging_a_transaction_into_itself_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let tx = new_tx(&engine, day(1), account, currency, "-60.00", &[]).await;
    let err = engine
        .merge_transactions("alice", tx.id, tx.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn resolving_a_pair_requires_a_link() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &[]).await;
    let discard = new_tx(&engine, day(1), account, currency, "-60.00", &[]).await;

    let err = engine
        .delete_duplicate_transaction("alice", keep.id, discard.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    engine
        .link_duplicates("alice", keep.id, discard.id)
        .await
        .unwrap();
    engine
        .delete_duplicate_transaction("alice", keep.id, discard.id)
        .await
        .unwrap();

    assert!(engine.transaction("alice", discard.id).await.is_err());
    assert_eq!(engine.list_merged_transactions("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn merge_invalidates_checkpoints_covering_the_discard() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &[]).await;
    let discard = new_tx(&engine, day(2), account, currency, "-60.00", &[]).await;
    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();

    engine
        .merge_transactions("alice", keep.id, discard.id)
        .await
        .unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn unmerge_invalidates_checkpoints_covering_the_restore() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;

    let keep = new_tx(&engine, day(1), account, currency, "-60.00", &[]).await;
    let discard = new_tx(&engine, day(2), account, currency, "-60.00", &[]).await;
    engine
        .merge_transactions("alice", keep.id, discard.id)
        .await
        .unwrap();

    engine
        .create_checkpoint(CreateCheckpointCmd::new("alice", account, currency, day(5)))
        .await
        .unwrap();
    engine.unmerge_transaction("alice", discard.id).await.unwrap();

    assert!(engine.list_checkpoints("alice", None).await.unwrap().is_empty());
}
