//! Tracking API routes for the authenticated user

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::TrackingService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use validator::Validate;
use wellness_tracker_shared::{
    DeviceListResponse, IntakeRequest, NotificationWindow, NotificationWindowRequest,
    RegisterDeviceRequest, SupplementStatusResponse, WaterSettingsRequest, WaterSummaryResponse,
};

/// Create tracking routes
pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/water", get(water_summary))
        .route("/water/intake", post(record_intake))
        .route("/water/settings", put(update_water_settings))
        .route("/notification-window", put(update_window))
        .route("/devices", post(register_device))
        .route("/supplements/:id/consume", post(consume_supplement))
}

/// GET /api/v1/me/water
async fn water_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<WaterSummaryResponse>, ApiError> {
    let ctx = state.run_context();
    Ok(Json(TrackingService::water_summary(&ctx, &auth.user_id).await?))
}

/// POST /api/v1/me/water/intake
async fn record_intake(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<IntakeRequest>,
) -> Result<Json<WaterSummaryResponse>, ApiError> {
    request.validate()?;
    let ctx = state.run_context();
    Ok(Json(TrackingService::record_intake(&ctx, &auth.user_id, request).await?))
}

/// PUT /api/v1/me/water/settings
async fn update_water_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<WaterSettingsRequest>,
) -> Result<Json<WaterSummaryResponse>, ApiError> {
    request.validate()?;
    let ctx = state.run_context();
    Ok(Json(
        TrackingService::update_water_settings(&ctx, &auth.user_id, request).await?,
    ))
}

/// PUT /api/v1/me/notification-window
async fn update_window(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<NotificationWindowRequest>,
) -> Result<Json<NotificationWindow>, ApiError> {
    request.validate()?;
    let ctx = state.run_context();
    Ok(Json(TrackingService::update_window(&ctx, &auth.user_id, request).await?))
}

/// POST /api/v1/me/devices
async fn register_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    request.validate()?;
    let ctx = state.run_context();
    Ok(Json(TrackingService::register_device(&ctx, &auth.user_id, request).await?))
}

/// POST /api/v1/me/supplements/:id/consume
async fn consume_supplement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SupplementStatusResponse>, ApiError> {
    let ctx = state.run_context();
    Ok(Json(
        TrackingService::consume_supplement(&ctx, &auth.user_id, &id).await?,
    ))
}
