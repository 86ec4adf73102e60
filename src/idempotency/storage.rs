use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Processing state of a webhook update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateStatus {
    Processing,
    Completed,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Processing => "PROCESSING",
            UpdateStatus::Completed => "COMPLETED",
        }
    }
}

impl TryFrom<String> for UpdateStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        match value.as_str() {
            "PROCESSING" => Ok(UpdateStatus::Processing),
            "COMPLETED" => Ok(UpdateStatus::Completed),
            other => Err(AppError::Validation(format!("unknown update status: {other}"))),
        }
    }
}

/// A Telegram update the bot has already seen.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedUpdate {
    pub update_id: i64,
    #[sqlx(try_from = "String")]
    pub status: UpdateStatus,
    pub received_at: DateTime<Utc>,
}

impl ProcessedUpdate {
    pub fn is_completed(&self) -> bool {
        self.status == UpdateStatus::Completed
    }
}

/// SQLite-backed record of processed update ids.
pub struct SqliteUpdateStore {
    pool: SqlitePool,
}

impl SqliteUpdateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Claims an update id. Returns false if it was already claimed.
    pub async fn try_acquire(&self, update_id: i64, received_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_updates (update_id, status, received_at)
            VALUES (?, ?, ?)
            ON CONFLICT (update_id) DO NOTHING
            "#,
        )
        .bind(update_id)
        .bind(UpdateStatus::Processing.as_str())
        .bind(received_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find(&self, update_id: i64) -> Result<Option<ProcessedUpdate>> {
        let record = sqlx::query_as::<_, ProcessedUpdate>(
            "SELECT update_id, status, received_at FROM processed_updates WHERE update_id = ?",
        )
        .bind(update_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(record)
    }

    pub async fn mark_completed(&self, update_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE processed_updates SET status = ? WHERE update_id = ?")
            .bind(UpdateStatus::Completed.as_str())
            .bind(update_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    /// Forgets a claim so a redelivery is processed again.
    pub async fn delete(&self, update_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM processed_updates WHERE update_id = ?")
            .bind(update_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes records received before `cutoff`.
    pub async fn cleanup_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM processed_updates WHERE received_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
