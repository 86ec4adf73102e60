use crate::error::{AppError, Result};
use crate::models::{ExpenseRecord, ExpenseRow, NewExpense};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for the append-only `expenses` table.
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an expense stamped with the given time.
    pub async fn create(&self, expense: &NewExpense, created_at: DateTime<Utc>) -> Result<ExpenseRecord> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            INSERT INTO expenses (chat_id, payer, amount, note, participants, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, chat_id, payer, amount, note, participants, created_at
            "#,
        )
        .bind(expense.chat_id)
        .bind(&expense.payer)
        .bind(expense.amount)
        .bind(&expense.note)
        .bind(expense.participants.to_column())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.into())
    }

    /// Lists a chat's expenses recorded at or after `since`, oldest first.
    pub async fn find_since(&self, chat_id: i64, since: DateTime<Utc>) -> Result<Vec<ExpenseRecord>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, chat_id, payer, amount, note, participants, created_at
            FROM expenses
            WHERE chat_id = ? AND created_at >= ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(chat_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(ExpenseRecord::from).collect())
    }

    /// Counts a chat's expenses.
    pub async fn count_by_chat(&self, chat_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM expenses WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0)
    }
}
