//! Scheduled job endpoints
//!
//! Called by an external scheduler: the daily reset once after local
//! midnight, the dispatch every minute.

use crate::error::ApiError;
use crate::services::Orchestrator;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use secrecy::ExposeSecret;
use tracing::error;
use wellness_tracker_shared::{DailyResetErrorResponse, DailyResetResponse, DispatchResponse};

/// Create job routes
pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/daily-reset",
            get(daily_reset).post(daily_reset).options(preflight),
        )
        .route("/dispatch", get(dispatch).post(dispatch).options(preflight))
}

/// Require `Authorization: Bearer <secret>` when a job secret is configured
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(secret) = &state.jobs_secret else {
        return Ok(());
    };
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == secret.expose_secret().as_str() => Ok(()),
        _ => Err(ApiError::Unauthorized("Invalid job secret".to_string())),
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// GET|POST /api/v1/jobs/daily-reset
async fn daily_reset(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let ctx = state.run_context();
    match Orchestrator::run_daily_reset(&ctx).await {
        Ok(stats) => Ok(Json(DailyResetResponse::completed(stats)).into_response()),
        Err(failure) => {
            error!(error = ?failure.source, "Daily reset failed");
            let body = DailyResetErrorResponse {
                success: false,
                error: failure.source.to_string(),
                stats: Some(failure.stats),
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// GET|POST /api/v1/jobs/dispatch
async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DispatchResponse>, ApiError> {
    authorize(&state, &headers)?;

    let ctx = state.run_context();
    let response = Orchestrator::run_dispatch(&ctx).await?;
    Ok(Json(response))
}
