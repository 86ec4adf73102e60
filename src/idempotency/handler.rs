use crate::error::Result;
use crate::idempotency::storage::SqliteUpdateStore;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for update de-duplication.
#[derive(Debug, Default)]
pub struct IdempotencyMetrics {
    pub total_updates: AtomicU64,
    pub duplicate_updates: AtomicU64,
    pub completed_updates: AtomicU64,
    pub released_updates: AtomicU64,
}

impl IdempotencyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_updates: self.total_updates.load(Ordering::Relaxed),
            duplicate_updates: self.duplicate_updates.load(Ordering::Relaxed),
            completed_updates: self.completed_updates.load(Ordering::Relaxed),
            released_updates: self.released_updates.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_updates: u64,
    pub duplicate_updates: u64,
    pub completed_updates: u64,
    pub released_updates: u64,
}

impl MetricsSnapshot {
    pub fn duplicate_rate(&self) -> f64 {
        if self.total_updates == 0 {
            0.0
        } else {
            self.duplicate_updates as f64 / self.total_updates as f64
        }
    }
}

/// Result of claiming an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheck {
    /// First delivery, process it.
    Started,
    /// Already seen, skip it.
    Duplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyHandlerConfig {
    /// How long processed update ids are remembered.
    pub retention_seconds: i64,
}

impl Default for IdempotencyHandlerConfig {
    fn default() -> Self {
        Self {
            retention_seconds: 86400,
        }
    }
}

/// De-duplicates Telegram webhook deliveries by `update_id`.
pub struct IdempotencyHandler {
    store: SqliteUpdateStore,
    config: IdempotencyHandlerConfig,
    metrics: Arc<IdempotencyMetrics>,
}

impl IdempotencyHandler {
    pub fn new(pool: SqlitePool, config: IdempotencyHandlerConfig) -> Self {
        Self {
            store: SqliteUpdateStore::new(pool),
            config,
            metrics: Arc::new(IdempotencyMetrics::new()),
        }
    }

    pub fn with_defaults(pool: SqlitePool) -> Self {
        Self::new(pool, IdempotencyHandlerConfig::default())
    }

    pub fn metrics(&self) -> Arc<IdempotencyMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn store(&self) -> &SqliteUpdateStore {
        &self.store
    }

    pub async fn begin(&self, update_id: i64) -> Result<UpdateCheck> {
        self.metrics.total_updates.fetch_add(1, Ordering::Relaxed);

        if self.store.try_acquire(update_id, Utc::now()).await? {
            Ok(UpdateCheck::Started)
        } else {
            self.metrics.duplicate_updates.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(update_id, "Duplicate update skipped");
            Ok(UpdateCheck::Duplicate)
        }
    }

    pub async fn complete(&self, update_id: i64) -> Result<()> {
        self.store.mark_completed(update_id).await?;
        self.metrics.completed_updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Drops the claim after a failure so Telegram's retry is handled.
    pub async fn release(&self, update_id: i64) -> Result<()> {
        self.store.delete(update_id).await?;
        self.metrics.released_updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::seconds(self.config.retention_seconds);
        self.store.cleanup_older_than(cutoff).await
    }
}

/// Background job that prunes old update ids.
pub struct IdempotencyCleanupJob {
    handler: Arc<IdempotencyHandler>,
    interval_seconds: u64,
}

impl IdempotencyCleanupJob {
    pub fn new(handler: Arc<IdempotencyHandler>, interval_seconds: u64) -> Self {
        Self {
            handler,
            interval_seconds,
        }
    }

    pub async fn run_once(&self) -> Result<u64> {
        self.handler.cleanup_expired().await
    }

    /// Starts the cleanup job in a background task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(self.interval_seconds));

            loop {
                interval.tick().await;

                match self.handler.cleanup_expired().await {
                    Ok(count) => {
                        if count > 0 {
                            tracing::info!("Cleaned up {} processed update records", count);
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to clean up processed update records: {}", e);
                    }
                }
            }
        })
    }
}
