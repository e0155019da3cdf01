//! User-facing tracking operations
//!
//! Every change that affects reminders recomputes the affected schedules
//! before returning, so the client always sees the new next reminder.

use crate::error::ApiError;
use crate::repositories::{SupplementRepository, UserRepository, WaterRepository};
use crate::services::context::RunContext;
use crate::services::supplements::SupplementService;
use crate::services::water::WaterService;
use serde_json::json;
use tracing::info;
use wellness_tracker_shared::{
    ClockTime, DeviceListResponse, IntakeAction, IntakeRequest, NotificationWindow,
    NotificationWindowRequest, RegisterDeviceRequest, SupplementStatusResponse, User, WaterSettingsRequest, WaterState, WaterSummaryResponse,
};

pub struct TrackingService;

impl TrackingService {
    async fn load_user(ctx: &RunContext, uid: &str) -> Result<User, ApiError> {
        Ok(UserRepository::get(ctx.store(), uid).await?.unwrap_or_else(|| User {
            id: uid.to_string(),
            ..Default::default()
        }))
    }

    async fn recompute_water(ctx: &RunContext, user: &User, water: &WaterState) -> Result<WaterSummaryResponse, ApiError> {
        WaterService::recompute_state(ctx, user, water).await?;
        let refreshed = WaterRepository::get(ctx.store(), &user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Water tracking not found".to_string()))?;
        Ok(WaterSummaryResponse::from(&refreshed))
    }

    pub async fn water_summary(ctx: &RunContext, uid: &str) -> Result<WaterSummaryResponse, ApiError> {
        let water = WaterRepository::get(ctx.store(), uid).await?.unwrap_or_default();
        Ok(WaterSummaryResponse::from(&water))
    }

    /// Add or remove one glass (or `amount_ml`); intake never drops below zero
    pub async fn record_intake(
        ctx: &RunContext,
        uid: &str,
        request: IntakeRequest,
    ) -> Result<WaterSummaryResponse, ApiError> {
        let user = Self::load_user(ctx, uid).await?;
        let IntakeRequest { action, amount_ml } = request;
        let water = WaterRepository::update(ctx.store(), uid, move |w| {
            let amount = amount_ml.unwrap_or(w.glass_size);
            w.water_intake = match action {
                IntakeAction::Add => w.water_intake + amount,
                IntakeAction::Remove => (w.water_intake - amount).max(0),
            };
        })
        .await?;

        info!(user_id = %uid, action = ?action, intake_ml = water.water_intake, "Water intake updated");
        Self::recompute_water(ctx, &user, &water).await
    }

    pub async fn update_water_settings(
        ctx: &RunContext,
        uid: &str,
        request: WaterSettingsRequest,
    ) -> Result<WaterSummaryResponse, ApiError> {
        if request.is_empty() {
            return Err(ApiError::Validation("No settings provided".to_string()));
        }

        if let Some(level) = request.activity_level {
            UserRepository::merge(ctx.store(), uid, json!({ "activityLevel": level })).await?;
        }
        let user = Self::load_user(ctx, uid).await?;

        let water = WaterRepository::update(ctx.store(), uid, move |w| {
            if let Some(mode) = request.water_notification_option {
                w.water_notification_option = mode;
            }
            if let Some(hours) = request.custom_interval_hours {
                w.custom_interval_hours = hours;
            }
            if let Some(size) = request.glass_size {
                w.glass_size = size;
            }
        })
        .await?;

        info!(user_id = %uid, mode = ?water.water_notification_option, "Water settings updated");
        Self::recompute_water(ctx, &user, &water).await
    }

    pub async fn register_device(
        ctx: &RunContext,
        uid: &str,
        request: RegisterDeviceRequest,
    ) -> Result<DeviceListResponse, ApiError> {
        UserRepository::add_token(ctx.store(), uid, &request.token).await?;
        let user = Self::load_user(ctx, uid).await?;

        info!(user_id = %uid, token_count = user.fcm_tokens.len(), "Device registered");
        Ok(DeviceListResponse {
            token_count: user.fcm_tokens.len(),
        })
    }

    /// Store the window and recompute water and supplement schedules
    pub async fn update_window(
        ctx: &RunContext,
        uid: &str,
        request: NotificationWindowRequest,
    ) -> Result<NotificationWindow, ApiError> {
        let window = NotificationWindow::new(
            request.start.parse::<ClockTime>()?,
            request.end.parse::<ClockTime>()?,
        );
        UserRepository::merge(ctx.store(), uid, json!({ "notificationWindow": window })).await?;
        let user = Self::load_user(ctx, uid).await?;

        WaterService::recompute(ctx, &user).await?;
        let scheduled = SupplementService::recompute_all(ctx, &user).await?;

        info!(
            user_id = %uid,
            start = %window.start,
            end = %window.end,
            supplements_scheduled = scheduled,
            "Notification window updated"
        );
        Ok(window)
    }

    /// Take one dose and recompute that supplement's reminders
    pub async fn consume_supplement(
        ctx: &RunContext,
        uid: &str,
        supplement_id: &str,
    ) -> Result<SupplementStatusResponse, ApiError> {
        let today = ctx.today();
        let item = SupplementRepository::consume(ctx.store(), uid, supplement_id, today)
            .await?
            .ok_or_else(|| ApiError::NotFound("Supplement not found".to_string()))?;

        let user = Self::load_user(ctx, uid).await?;
        let plan = SupplementService::recompute_one(ctx, &user, supplement_id).await?;
        let consumed = SupplementRepository::stats(ctx.store(), uid, today)
            .await?
            .consumed(&item.name);

        info!(
            user_id = %uid,
            supplement = %item.name,
            remaining = item.quantity,
            consumed_today = consumed,
            "Supplement consumed"
        );
        Ok(SupplementStatusResponse::new(
            &item,
            consumed,
            plan.and_then(|p| p.next().map(|r| r.time)),
        ))
    }
}
