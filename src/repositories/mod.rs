pub mod alias_repository;
pub mod expense_repository;
pub mod period_repository;

pub use alias_repository::AliasRepository;
pub use expense_repository::ExpenseRepository;
pub use period_repository::PeriodRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{ExpenseRecord, NameAlias, NewExpense};

/// Database connection pool type alias.
pub type DbPool = SqlitePool;

/// Per-chat state the ledger service reads and writes, keyed by chat id.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn append_expense(&self, expense: &NewExpense, at: DateTime<Utc>) -> Result<ExpenseRecord>;

    /// Expenses of the chat recorded at or after `since`, oldest first.
    async fn expenses_since(&self, chat_id: i64, since: DateTime<Utc>) -> Result<Vec<ExpenseRecord>>;

    async fn period_start(&self, chat_id: i64) -> Result<Option<DateTime<Utc>>>;

    async fn set_period_start(&self, chat_id: i64, start: DateTime<Utc>) -> Result<()>;

    /// Deletes all of the chat's expenses and moves the period start.
    /// Returns the number of deleted expenses.
    async fn reset_period(&self, chat_id: i64, start: DateTime<Utc>) -> Result<u64>;

    async fn aliases(&self, chat_id: i64) -> Result<Vec<NameAlias>>;

    async fn resolve_alias(&self, chat_id: i64, initial: &str) -> Result<Option<String>>;

    async fn upsert_aliases(&self, aliases: &[NameAlias]) -> Result<()>;

    async fn alias_count(&self, chat_id: i64) -> Result<i64>;
}

/// `ExpenseStore` backed by the SQLite tables.
pub struct SqliteExpenseStore {
    expenses: ExpenseRepository,
    periods: PeriodRepository,
    aliases: AliasRepository,
}

impl SqliteExpenseStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            expenses: ExpenseRepository::new(pool.clone()),
            periods: PeriodRepository::new(pool.clone()),
            aliases: AliasRepository::new(pool),
        }
    }

    pub async fn expense_count(&self, chat_id: i64) -> Result<i64> {
        self.expenses.count_by_chat(chat_id).await
    }
}

#[async_trait]
impl ExpenseStore for SqliteExpenseStore {
    async fn append_expense(&self, expense: &NewExpense, at: DateTime<Utc>) -> Result<ExpenseRecord> {
        self.expenses.create(expense, at).await
    }

    async fn expenses_since(&self, chat_id: i64, since: DateTime<Utc>) -> Result<Vec<ExpenseRecord>> {
        self.expenses.find_since(chat_id, since).await
    }

    async fn period_start(&self, chat_id: i64) -> Result<Option<DateTime<Utc>>> {
        self.periods.find(chat_id).await
    }

    async fn set_period_start(&self, chat_id: i64, start: DateTime<Utc>) -> Result<()> {
        self.periods.upsert(chat_id, start).await
    }

    async fn reset_period(&self, chat_id: i64, start: DateTime<Utc>) -> Result<u64> {
        self.periods.reset(chat_id, start).await
    }

    async fn aliases(&self, chat_id: i64) -> Result<Vec<NameAlias>> {
        self.aliases.find_by_chat(chat_id).await
    }

    async fn resolve_alias(&self, chat_id: i64, initial: &str) -> Result<Option<String>> {
        self.aliases.find_fullname(chat_id, initial).await
    }

    async fn upsert_aliases(&self, aliases: &[NameAlias]) -> Result<()> {
        self.aliases.upsert_batch(aliases).await
    }

    async fn alias_count(&self, chat_id: i64) -> Result<i64> {
        self.aliases.count_by_chat(chat_id).await
    }
}
