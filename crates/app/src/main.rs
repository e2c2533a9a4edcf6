use std::sync::Arc;
use std::time::Duration;

use engine::{DuplicateScanner, ScannerConfig};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "quadra={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    let scanner_config = match &settings.scanner {
        Some(scanner) => ScannerConfig {
            interval: Duration::from_secs(scanner.interval_hours.unwrap_or(24) * 60 * 60),
            window_days: scanner.window_days.unwrap_or(30),
        },
        None => ScannerConfig::default(),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut tasks = tokio::task::JoinSet::new();

    let server_engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;
    let server_db = db.clone();
    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    tasks.spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("failed to bind server listener: {err}");
                return;
            }
        };
        if let Err(err) = server::run_with_listener(server_engine, server_db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    let scanner_engine = engine::Engine::builder().database(db).build().await?;
    let scanner = DuplicateScanner::new(Arc::new(scanner_engine), scanner_config, shutdown_rx);
    tasks.spawn(async move {
        scanner.run().await;
    });

    tasks.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
