use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::idempotency::IdempotencyHandler;
use crate::observability::HealthChecker;
use crate::repositories::DbPool;
use crate::services::LedgerService;
use crate::telegram::Messenger;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub ledger: Arc<LedgerService>,
    pub messenger: Arc<dyn Messenger>,
    pub idempotency: Arc<IdempotencyHandler>,
    pub webhook_secret: Arc<str>,
    pub metrics_handle: Option<PrometheusHandle>,
    pub health_checker: Option<Arc<HealthChecker>>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        ledger: Arc<LedgerService>,
        messenger: Arc<dyn Messenger>,
        webhook_secret: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            idempotency: Arc::new(IdempotencyHandler::with_defaults(pool.clone())),
            pool,
            ledger,
            messenger,
            webhook_secret: webhook_secret.into(),
            metrics_handle: None,
            health_checker: None,
        }
    }

    /// Adds metrics handle to the state.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Adds health checker to the state.
    pub fn with_health_checker(mut self, checker: Arc<HealthChecker>) -> Self {
        self.health_checker = Some(checker);
        self
    }

    pub fn with_idempotency(mut self, handler: Arc<IdempotencyHandler>) -> Self {
        self.idempotency = handler;
        self
    }
}

/// Creates the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/:secret", post(handlers::telegram_webhook))
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/detailed", get(handlers::detailed_health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
