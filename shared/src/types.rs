//! API request and response types

use crate::health_metrics::ActivityLevel;
use crate::models::{ReminderEvent, SupplementItem, WaterReminderMode, WaterState};
use crate::validation::validate_clock_time_field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Jobs
// ============================================================================

/// Counters reported by a daily reset run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyResetStats {
    pub total_users: usize,
    pub water_reset_count: usize,
    pub water_notification_count: usize,
    pub supplement_notification_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyResetResponse {
    pub success: bool,
    pub message: String,
    pub stats: DailyResetStats,
}

impl DailyResetResponse {
    pub fn completed(stats: DailyResetStats) -> Self {
        Self {
            success: true,
            message: "Daily reset completed".to_string(),
            stats,
        }
    }
}

/// Failure body of a daily reset run, with whatever was counted before it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyResetErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DailyResetStats>,
}

/// Outcome of one push attempt to one device token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeliveryResult {
    pub token: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_remove: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl TokenDeliveryResult {
    pub fn delivered(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            valid: true,
            should_remove: None,
            error_code: None,
        }
    }

    pub fn failed(token: impl Into<String>, error_code: impl Into<String>, should_remove: bool) -> Self {
        Self {
            token: token.into(),
            valid: false,
            should_remove: Some(should_remove),
            error_code: Some(error_code.into()),
        }
    }

    pub fn must_remove(&self) -> bool {
        self.should_remove.unwrap_or(false)
    }
}

/// One notification sent during a dispatch run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub category: String,
    pub title: String,
    pub deliveries: Vec<TokenDeliveryResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDispatchResult {
    pub user_id: String,
    pub results: Vec<NotificationOutcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub results: Vec<UserDispatchResult>,
}

// ============================================================================
// Tracking
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeAction {
    Add,
    Remove,
}

/// Log or undo one glass (or an explicit amount)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    pub action: IntakeAction,
    #[validate(range(min = 1, max = 5000))]
    pub amount_ml: Option<i64>,
}

/// Device push token to register for the user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, max = 4096))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListResponse {
    pub token_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WaterSettingsRequest {
    pub water_notification_option: Option<WaterReminderMode>,
    #[validate(range(min = 0.5, max = 12.0))]
    pub custom_interval_hours: Option<f64>,
    #[validate(range(min = 50, max = 2000))]
    pub glass_size: Option<i64>,
    pub activity_level: Option<ActivityLevel>,
}

impl WaterSettingsRequest {
    pub fn is_empty(&self) -> bool {
        self.water_notification_option.is_none()
            && self.custom_interval_hours.is_none()
            && self.glass_size.is_none()
            && self.activity_level.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationWindowRequest {
    #[validate(custom(function = "validate_clock_time_field"))]
    pub start: String,
    #[validate(custom(function = "validate_clock_time_field"))]
    pub end: String,
}

/// Current water status for the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterSummaryResponse {
    pub water_intake: i64,
    pub daily_water_target: i64,
    pub glass_size: i64,
    pub progress_percent: f64,
    pub water_notification_option: WaterReminderMode,
    pub next_water_reminder_time: Option<DateTime<Utc>>,
    pub reminder_times: Vec<ReminderEvent>,
    pub yesterday_water_intake: Option<i64>,
}

impl From<&WaterState> for WaterSummaryResponse {
    fn from(water: &WaterState) -> Self {
        Self {
            water_intake: water.water_intake,
            daily_water_target: water.daily_water_target,
            glass_size: water.glass_size,
            progress_percent: (water.progress_percent() * 10.0).round() / 10.0,
            water_notification_option: water.water_notification_option,
            next_water_reminder_time: water.next_water_reminder_time,
            reminder_times: water.reminder_times.clone(),
            yesterday_water_intake: water.yesterday_water_intake,
        }
    }
}

/// Supplement state after a dose was taken
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementStatusResponse {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub daily_usage: i64,
    pub consumed_today: i64,
    pub next_supplement_reminder_time: Option<DateTime<Utc>>,
}

impl SupplementStatusResponse {
    pub fn new(item: &SupplementItem, consumed_today: i64, next: Option<DateTime<Utc>>) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            daily_usage: item.daily_usage,
            consumed_today,
            next_supplement_reminder_time: next,
        }
    }
}
