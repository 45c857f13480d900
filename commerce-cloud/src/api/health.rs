//! Health check endpoints

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
        .route("/api/health", get(health_check))
}

fn status(status: &'static str) -> HealthStatus {
    HealthStatus {
        status,
        service: "commerce-cloud",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("dev"),
    }
}

/// GET /health - liveness
pub async fn health_check() -> ApiResponse<HealthStatus> {
    ApiResponse::success(status("ok"))
}

/// GET /health/ready - the database answers
pub async fn readiness(State(state): State<AppState>) -> Result<ApiResponse<HealthStatus>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Readiness probe failed");
            AppError::with_message(ErrorCode::DatabaseError, "Database unavailable")
        })?;
    Ok(ApiResponse::success(status("ready")))
}
