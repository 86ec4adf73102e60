use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for the per-chat period start.
pub struct PeriodRepository {
    pool: SqlitePool,
}

impl PeriodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, chat_id: i64) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT period_start FROM periods WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(row.map(|r| r.0))
    }

    pub async fn upsert(&self, chat_id: i64, period_start: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO periods (chat_id, period_start)
            VALUES (?, ?)
            ON CONFLICT (chat_id) DO UPDATE SET period_start = excluded.period_start
            "#,
        )
        .bind(chat_id)
        .bind(period_start)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Deletes the chat's expenses and moves its period start in one transaction.
    pub async fn reset(&self, chat_id: i64, period_start: DateTime<Utc>) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let deleted = sqlx::query("DELETE FROM expenses WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO periods (chat_id, period_start)
            VALUES (?, ?)
            ON CONFLICT (chat_id) DO UPDATE SET period_start = excluded.period_start
            "#,
        )
        .bind(chat_id)
        .bind(period_start)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(deleted)
    }
}
