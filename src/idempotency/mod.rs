pub mod handler;
pub mod storage;

pub use handler::{
    IdempotencyCleanupJob, IdempotencyHandler, IdempotencyHandlerConfig, IdempotencyMetrics,
    MetricsSnapshot, UpdateCheck,
};
pub use storage::{ProcessedUpdate, SqliteUpdateStore, UpdateStatus};
