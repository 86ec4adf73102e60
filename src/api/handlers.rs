use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::api::responses::{ApiResponse, ErrorResponse, HealthResponse, ServiceHealth, WebhookAck};
use crate::commands::parse_message;
use crate::error::AppError;
use crate::idempotency::UpdateCheck;
use crate::observability::{get_metrics, AggregatedHealth};
use crate::telegram::Update;

use super::routes::AppState;

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::<()>::error(ErrorResponse::new(code, message))))
}

fn from_app_error(err: &AppError) -> ApiError {
    let status = match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.code(), err.to_string())
}

/// Compares digests so the check does not short-circuit on the secret's prefix.
fn secret_matches(given: &str, expected: &str) -> bool {
    Sha256::digest(given.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// Telegram webhook endpoint.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let metrics = get_metrics();

    if !secret_matches(&secret, &state.webhook_secret) {
        warn!("Webhook called with a wrong secret");
        metrics.record_webhook_update("forbidden");
        return Err(api_error(StatusCode::FORBIDDEN, "FORBIDDEN", "Invalid webhook secret"));
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed update payload");
        metrics.record_webhook_update("malformed");
        api_error(StatusCode::BAD_REQUEST, "INVALID_UPDATE", e.to_string())
    })?;

    let Some((chat_id, text)) = update.text_message() else {
        metrics.record_webhook_update("ignored");
        return Ok(Json(WebhookAck::ok()));
    };

    let parsed = match parse_message(text) {
        Ok(None) => {
            debug!(update_id = update.update_id, "Message is not for the bot");
            metrics.record_webhook_update("ignored");
            return Ok(Json(WebhookAck::ok()));
        }
        Ok(Some(command)) => Ok(command),
        Err(usage) => Err(usage),
    };

    let update_id = update.update_id;
    match state.idempotency.begin(update_id).await {
        Ok(UpdateCheck::Started) => {}
        Ok(UpdateCheck::Duplicate) => {
            metrics.record_webhook_update("duplicate");
            return Ok(Json(WebhookAck::ok()));
        }
        Err(e) => {
            error!(update_id, error = %e, "Failed to claim update");
            return Err(from_app_error(&e));
        }
    }

    let reply = match parsed {
        Ok(command) => match state.ledger.handle(chat_id, command).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(update_id, chat_id, error = %e, "Failed to handle update");
                if let Err(release_err) = state.idempotency.release(update_id).await {
                    error!(update_id, error = %release_err, "Failed to release update claim");
                }
                metrics.record_webhook_update("failed");
                return Err(from_app_error(&e));
            }
        },
        Err(usage) => usage.to_string(),
    };

    if let Err(e) = state.idempotency.complete(update_id).await {
        warn!(update_id, error = %e, "Failed to mark update completed");
    }

    // The command already took effect; a redelivery must not apply it twice.
    if let Err(e) = state.messenger.send_message(chat_id, &reply).await {
        error!(update_id, chat_id, error = %e, "Failed to send reply");
        metrics.record_webhook_update("reply_failed");
        return Ok(Json(WebhookAck::ok()));
    }

    info!(update_id, chat_id, "Update handled");
    metrics.record_webhook_update("handled");
    Ok(Json(WebhookAck::ok()))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let db_healthy = match &state.health_checker {
        Some(checker) => !checker.check_database().await.status.is_unhealthy(),
        None => sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok(),
    };

    let response = HealthResponse {
        status: if db_healthy { "healthy".to_string() } else { "unhealthy".to_string() },
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        services: ServiceHealth { database: db_healthy },
    };

    Json(ApiResponse::success(response))
}

/// Detailed health with per-dependency latency.
pub async fn detailed_health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AggregatedHealth>>, ApiError> {
    let checker = state.health_checker.as_ref().ok_or_else(|| {
        api_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Health checker not configured")
    })?;

    Ok(Json(ApiResponse::success(checker.check_all().await)))
}

/// Readiness check endpoint.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    let ready = match &state.health_checker {
        Some(checker) => checker.is_ready().await,
        None => sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok(),
    };

    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Prometheus exposition.
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cre", "s3cret"));
        assert!(!secret_matches("", "s3cret"));
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = from_app_error(&AppError::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = from_app_error(&AppError::NotFound("chat".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = from_app_error(&AppError::Internal(anyhow::anyhow!("boom")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.error.unwrap().code, "INTERNAL_ERROR");
    }
}
