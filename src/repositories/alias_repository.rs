use crate::error::{AppError, Result};
use crate::models::NameAlias;
use sqlx::SqlitePool;

/// Repository for initial→fullname aliases.
pub struct AliasRepository {
    pool: SqlitePool,
}

impl AliasRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces aliases in a single transaction.
    pub async fn upsert_batch(&self, aliases: &[NameAlias]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        for alias in aliases {
            sqlx::query(
                r#"
                INSERT INTO name_aliases (chat_id, initial, fullname)
                VALUES (?, ?, ?)
                ON CONFLICT (chat_id, initial) DO UPDATE SET fullname = excluded.fullname
                "#,
            )
            .bind(alias.chat_id)
            .bind(&alias.initial)
            .bind(&alias.fullname)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    pub async fn find_fullname(&self, chat_id: i64, initial: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT fullname FROM name_aliases WHERE chat_id = ? AND initial = ?",
        )
        .bind(chat_id)
        .bind(initial.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| r.0))
    }

    /// Lists a chat's aliases in the order they were first defined.
    pub async fn find_by_chat(&self, chat_id: i64) -> Result<Vec<NameAlias>> {
        let rows = sqlx::query_as::<_, NameAlias>(
            r#"
            SELECT chat_id, initial, fullname
            FROM name_aliases
            WHERE chat_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(rows)
    }

    pub async fn count_by_chat(&self, chat_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(1) FROM name_aliases WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(count.0)
    }
}
