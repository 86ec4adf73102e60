use expense_settlement::api::{create_router, AppState};
use expense_settlement::config::Settings;
use expense_settlement::idempotency::{IdempotencyCleanupJob, IdempotencyHandler};
use expense_settlement::observability::{
    fingerprint, init_logging, init_metrics, mask_sensitive, HealthChecker, LogConfig,
};
use expense_settlement::repositories::{ExpenseStore, SqliteExpenseStore};
use expense_settlement::services::LedgerService;
use expense_settlement::telegram::{ClientConfig, Messenger, TelegramClient};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    init_logging(&LogConfig::from_settings(&settings.application));
    info!("Configuration loaded");

    info!("Connecting to database at {}...", settings.database.url);
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;
    info!("Database connection established");

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    let metrics_handle = init_metrics();

    let store: Arc<dyn ExpenseStore> = Arc::new(SqliteExpenseStore::new(pool.clone()));
    let ledger = Arc::new(LedgerService::new(store, settings.roster.pairs()));

    info!(
        token = %mask_sensitive(&settings.telegram.token, 4),
        secret_fingerprint = %fingerprint(&settings.telegram.webhook_secret),
        "Telegram client configured"
    );
    let messenger: Arc<dyn Messenger> =
        Arc::new(TelegramClient::new(ClientConfig::from(&settings.telegram))?);

    let idempotency = Arc::new(IdempotencyHandler::with_defaults(pool.clone()));
    IdempotencyCleanupJob::new(Arc::clone(&idempotency), CLEANUP_INTERVAL_SECS).start();

    let state = AppState::new(
        pool.clone(),
        ledger,
        messenger,
        settings.telegram.webhook_secret.as_str(),
    )
    .with_idempotency(idempotency)
    .with_metrics(metrics_handle)
    .with_health_checker(Arc::new(HealthChecker::new(pool)));

    let addr = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
