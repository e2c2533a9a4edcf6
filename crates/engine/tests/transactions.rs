use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateAccountCmd, CreateCurrencyCmd, CreateTransactionCmd, Engine, MovementDraft, Transaction,
    UpdateTransactionCmd,
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

async fn annotated_tx(engine: &Engine, account: Uuid, currency: Uuid) -> Transaction {
    engine
        .create_transaction(
            CreateTransactionCmd::new("alice", day(1), "groceries")
                .place("corner market")
                .partner("Rossi & Sons")
                .notes("weekly run")
                .movement(MovementDraft::new(currency, amount("-42.00")).account_id(account)),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn absent_fields_leave_optional_text_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;
    let tx = annotated_tx(&engine, account, currency).await;

    let updated = engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).description("groceries, june"))
        .await
        .unwrap();

    assert_eq!(updated.place.as_deref(), Some("corner market"));
    assert_eq!(updated.partner.as_deref(), Some("Rossi & Sons"));
    assert_eq!(updated.notes.as_deref(), Some("weekly run"));
}

#[tokio::test]
async fn an_empty_string_clears_optional_text() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;
    let tx = annotated_tx(&engine, account, currency).await;

    let updated = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .place("")
                .notes("   "),
        )
        .await
        .unwrap();

    assert_eq!(updated.place, None);
    assert_eq!(updated.notes, None);
    // Untouched fields stay.
    assert_eq!(updated.partner.as_deref(), Some("Rossi & Sons"));
}

#[tokio::test]
async fn present_text_replaces_the_stored_value() {
    let (engine, _db) = engine_with_db().await;
    let (currency, account) = setup_refs(&engine).await;
    let tx = annotated_tx(&engine, account, currency).await;

    let updated = engine
        .update_transaction(UpdateTransactionCmd::new("alice", tx.id).place("  main square  "))
        .await
        .unwrap();

    assert_eq!(updated.place.as_deref(), Some("main square"));
}
