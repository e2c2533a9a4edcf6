use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateAccountCmd, CreateCurrencyCmd, CreateTransactionCmd, Engine, EngineError, MovementDraft,
    SuspiciousReason, Transaction, UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![username.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn setup_refs(engine: &Engine, owner: &str) -> (Uuid, Uuid) {
    let currency = engine
        .create_currency(CreateCurrencyCmd::new(owner, "EUR", "Euro"))
        .await
        .unwrap();
    let account = engine
        .create_account(CreateAccountCmd::new(owner, "Bank", currency.id))
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
    owner: &str,
    date: DateTime<Utc>,
    account: Uuid,
    currency: Uuid,
    value: &str,
    external_ids: &[&str],
) -> Transaction {
    let mut cmd = CreateTransactionCmd::new(owner, date, "groceries")
        .movement(MovementDraft::new(currency, amount(value)).account_id(account));
    for id in external_ids {
        cmd = cmd.external_id(*id);
    }
    engine.create_transaction(cmd).await.unwrap()
}

#[tokio::test]
async fn linking_flags_both_endpoints() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-42.00", &[]).await;
    let b = new_tx(&engine, "alice", day(2), account, currency, "-42.00", &[]).await;

    engine.link_duplicates("alice", a.id, b.id).await.unwrap();

    for id in [a.id, b.id] {
        let tx = engine.transaction("alice", id).await.unwrap();
        assert!(tx.is_suspicious(SuspiciousReason::DuplicateCandidate));
    }
    assert_eq!(engine.list_duplicate_pairs("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn linking_is_idempotent_and_symmetric() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-42.00", &[]).await;
    let b = new_tx(&engine, "alice", day(2), account, currency, "-42.00", &[]).await;

    engine.link_duplicates("alice", a.id, b.id).await.unwrap();
    engine.link_duplicates("alice", a.id, b.id).await.unwrap();
    engine.link_duplicates("alice", b.id, a.id).await.unwrap();

    assert_eq!(engine.list_duplicate_pairs("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn linking_a_transaction_to_itself_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-42.00", &[]).await;

    let err = engine.link_duplicates("alice", a.id, a.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn unlinking_clears_flag_only_when_last_link_drops() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-10.00", &[]).await;
    let b = new_tx(&engine, "alice", day(1), account, currency, "-10.00", &[]).await;
    let c = new_tx(&engine, "alice", day(2), account, currency, "-10.00", &[]).await;

    engine.link_duplicates("alice", a.id, b.id).await.unwrap();
    engine.link_duplicates("alice", a.id, c.id).await.unwrap();

    engine.unlink_duplicates("alice", a.id, b.id).await.unwrap();

    let a = engine.transaction("alice", a.id).await.unwrap();
    let b = engine.transaction("alice", b.id).await.unwrap();
    // a keeps its flag through the a-c link; b had only the dropped one.
    assert!(a.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert!(!b.is_suspicious(SuspiciousReason::DuplicateCandidate));
}

#[tokio::test]
async fn dismissal_clears_links_and_survives_rescans() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(
        &engine,
        "alice",
        Utc::now(),
        account,
        currency,
        "-33.00",
        &["bank:1"],
    )
    .await;
    let b = new_tx(
        &engine,
        "alice",
        Utc::now(),
        account,
        currency,
        "-33.00",
        &["csv:9"],
    )
    .await;

    engine.link_duplicates("alice", a.id, b.id).await.unwrap();
    let dismissed = engine.dismiss_duplicate("alice", a.id).await.unwrap();
    assert!(dismissed.dismissed);
    assert!(!dismissed.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());

    let b = engine.transaction("alice", b.id).await.unwrap();
    assert!(!b.is_suspicious(SuspiciousReason::DuplicateCandidate));

    // The scanner must not resurrect the pair.
    let new_links = engine.scan_owner_for_duplicates("alice", 30).await.unwrap();
    assert_eq!(new_links, 0);
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn scan_links_cross_source_pairs_only() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let imported = new_tx(
        &engine,
        "alice",
        Utc::now(),
        account,
        currency,
        "-50.00",
        &["bank:1"],
    )
    .await;
    let from_csv = new_tx(
        &engine,
        "alice",
        Utc::now(),
        account,
        currency,
        "-50.00",
        &["csv:7"],
    )
    .await;
    // Shares an import id with each row above: already deduplicated at the
    // source, so the scanner must not link it to either.
    let same_source = new_tx(
        &engine,
        "alice",
        Utc::now(),
        account,
        currency,
        "-50.00",
        &["bank:1", "csv:7"],
    )
    .await;
    // No external ids: manual entry, the scanner leaves it alone.
    let manual = new_tx(&engine, "alice", Utc::now(), account, currency, "-50.00", &[]).await;

    let new_links = engine.scan_owner_for_duplicates("alice", 30).await.unwrap();
    assert_eq!(new_links, 1);

    let pairs = engine.list_duplicate_pairs("alice").await.unwrap();
    assert_eq!(pairs.len(), 1);
    let linked: Vec<Uuid> = vec![pairs[0].first.id, pairs[0].second.id];
    assert!(linked.contains(&imported.id));
    assert!(linked.contains(&from_csv.id));

    for id in [same_source.id, manual.id] {
        let tx = engine.transaction("alice", id).await.unwrap();
        assert!(!tx.is_suspicious(SuspiciousReason::DuplicateCandidate));
    }

    // A second pass finds nothing new.
    let new_links = engine.scan_owner_for_duplicates("alice", 30).await.unwrap();
    assert_eq!(new_links, 0);
}

#[tokio::test]
async fn scan_ignores_transactions_outside_window() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let old = Utc::now() - chrono::Duration::days(90);
    new_tx(&engine, "alice", old, account, currency, "-50.00", &["bank:1"]).await;
    new_tx(&engine, "alice", old, account, currency, "-50.00", &["csv:7"]).await;

    let new_links = engine.scan_owner_for_duplicates("alice", 30).await.unwrap();
    assert_eq!(new_links, 0);
}

#[tokio::test]
async fn editing_amounts_drops_stale_links() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    let b = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    engine.link_duplicates("alice", a.id, b.id).await.unwrap();

    let updated = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", b.id)
                .movements(vec![MovementDraft::new(currency, amount("-21.00")).account_id(account)]),
        )
        .await
        .unwrap();

    assert!(!updated.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());

    let a = engine.transaction("alice", a.id).await.unwrap();
    assert!(!a.is_suspicious(SuspiciousReason::DuplicateCandidate));
}

#[tokio::test]
async fn metadata_edits_keep_links() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    let b = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    engine.link_duplicates("alice", a.id, b.id).await.unwrap();

    let updated = engine
        .update_transaction(UpdateTransactionCmd::new("alice", b.id).description("renamed"))
        .await
        .unwrap();

    assert!(updated.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert_eq!(engine.list_duplicate_pairs("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_an_endpoint_clears_the_neighbor() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    let b = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    engine.link_duplicates("alice", a.id, b.id).await.unwrap();

    engine.delete_transaction("alice", a.id).await.unwrap();

    let err = engine.transaction("alice", a.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));

    let b = engine.transaction("alice", b.id).await.unwrap();
    assert!(!b.is_suspicious(SuspiciousReason::DuplicateCandidate));
    assert!(engine.list_duplicate_pairs("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn imported_transactions_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let imported = new_tx(
        &engine,
        "alice",
        day(1),
        account,
        currency,
        "-20.00",
        &["bank:1"],
    )
    .await;

    let err = engine
        .delete_transaction("alice", imported.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(engine.transaction("alice", imported.id).await.is_ok());
}

#[tokio::test]
async fn owners_cannot_touch_each_others_transactions() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine, "alice").await;

    let a = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;
    let b = new_tx(&engine, "alice", day(1), account, currency, "-20.00", &[]).await;

    let err = engine.link_duplicates("bob", a.id, b.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));

    let err = engine.transaction("bob", a.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transaction not exists".to_string()));
}
