#![allow(dead_code)]

use expense_settlement::repositories::{ExpenseStore, SqliteExpenseStore};
use expense_settlement::services::LedgerService;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Fresh in-memory database with migrations applied.
/// A single connection that never expires keeps the same database alive.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn default_aliases() -> Vec<(String, String)> {
    vec![
        ("b".to_string(), "Bình".to_string()),
        ("a".to_string(), "An".to_string()),
        ("d".to_string(), "Duy".to_string()),
    ]
}

pub fn ledger_for(pool: &SqlitePool) -> Arc<LedgerService> {
    let store: Arc<dyn ExpenseStore> = Arc::new(SqliteExpenseStore::new(pool.clone()));
    Arc::new(LedgerService::new(store, default_aliases()))
}
