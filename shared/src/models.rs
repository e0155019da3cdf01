//! Document models for the wellness tracker
//!
//! These mirror the JSON documents kept in the document store. Field names
//! are camelCase on the wire; missing fields fall back to defaults so that
//! partially written documents still load.

use crate::environment::{EnvironmentalForecast, EnvironmentalSignal};
use crate::health_metrics::{ActivityLevel, UserProfile};
use crate::time::ClockTime;
use crate::window::NotificationWindow;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Daily water target used before the first smart recalculation (ml)
pub const DEFAULT_DAILY_WATER_TARGET_ML: i64 = 2000;
/// Default glass size (ml)
pub const DEFAULT_GLASS_SIZE_ML: i64 = 250;
/// Default custom reminder interval (hours)
pub const DEFAULT_CUSTOM_INTERVAL_HOURS: f64 = 1.0;

// ============================================================================
// User
// ============================================================================

/// Geographic position used for environmental lookups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// User document (`users/{uid}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id; taken from the path, never stored in the body
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub fcm_tokens: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notification_window: Option<NotificationWindow>,
    #[serde(default, deserialize_with = "lenient")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub profile: Option<UserProfile>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<GeoLocation>,
    #[serde(default)]
    pub last_water_summary_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_supplement_summary_date: Option<NaiveDate>,
}

/// Optional field that reads as `None` when the stored value does not parse
///
/// Unknown activity levels or a broken window fall back to defaults instead
/// of making the whole user document unreadable.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl User {
    /// Configured window, or the 07:00-22:00 default
    pub fn window_or_default(&self) -> NotificationWindow {
        self.notification_window.unwrap_or_default()
    }

    pub fn activity_or_default(&self) -> ActivityLevel {
        self.activity_level.unwrap_or_default()
    }

    pub fn has_tokens(&self) -> bool {
        !self.fcm_tokens.is_empty()
    }
}

// ============================================================================
// Water
// ============================================================================

/// How water reminders are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaterReminderMode {
    /// No reminders
    None,
    /// Environment-driven spacing across the window
    #[default]
    Smart,
    /// Fixed user-chosen interval
    Custom,
}

/// A scheduled reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub time: DateTime<Utc>,
    pub message: String,
}

impl ReminderEvent {
    pub fn new(time: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            time,
            message: message.into(),
        }
    }
}

/// One rolled-over day of water intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub intake: i64,
}

/// Cached daily average signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeatherAverages {
    pub date: NaiveDate,
    pub signal: EnvironmentalSignal,
}

/// Cached hourly samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeatherData {
    pub date: NaiveDate,
    pub samples: Vec<EnvironmentalSignal>,
}

/// Water tracking document (`users/{uid}/water/current`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterState {
    #[serde(default)]
    pub water_intake: i64,
    #[serde(default = "default_daily_target")]
    pub daily_water_target: i64,
    #[serde(default = "default_glass_size")]
    pub glass_size: i64,
    #[serde(default)]
    pub water_notification_option: WaterReminderMode,
    #[serde(default = "default_custom_interval")]
    pub custom_interval_hours: f64,
    #[serde(default)]
    pub daily_weather_averages: Option<DailyWeatherAverages>,
    #[serde(default)]
    pub hourly_weather_data: Option<HourlyWeatherData>,
    #[serde(default)]
    pub reminder_times: Vec<ReminderEvent>,
    #[serde(default)]
    pub next_water_reminder_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_water_reminder_message: Option<String>,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub yesterday_water_intake: Option<i64>,
    /// Target that applied to the day in `yesterday_water_intake`
    #[serde(default)]
    pub yesterday_water_target: Option<i64>,
    #[serde(default)]
    pub bmr: Option<f64>,
    #[serde(default)]
    pub num_glasses_required: Option<i64>,
    #[serde(default)]
    pub server_recalculated: bool,
}

fn default_daily_target() -> i64 {
    DEFAULT_DAILY_WATER_TARGET_ML
}

fn default_glass_size() -> i64 {
    DEFAULT_GLASS_SIZE_ML
}

fn default_custom_interval() -> f64 {
    DEFAULT_CUSTOM_INTERVAL_HOURS
}

impl Default for WaterState {
    fn default() -> Self {
        Self {
            water_intake: 0,
            daily_water_target: DEFAULT_DAILY_WATER_TARGET_ML,
            glass_size: DEFAULT_GLASS_SIZE_ML,
            water_notification_option: WaterReminderMode::default(),
            custom_interval_hours: DEFAULT_CUSTOM_INTERVAL_HOURS,
            daily_weather_averages: None,
            hourly_weather_data: None,
            reminder_times: Vec::new(),
            next_water_reminder_time: None,
            next_water_reminder_message: None,
            last_reset_date: None,
            history: Vec::new(),
            yesterday_water_intake: None,
            yesterday_water_target: None,
            bmr: None,
            num_glasses_required: None,
            server_recalculated: false,
        }
    }
}

impl WaterState {
    /// Cached forecast for `date`, if both halves were stored for that date
    pub fn cached_forecast(&self, date: NaiveDate) -> Option<EnvironmentalForecast> {
        let daily = self.daily_weather_averages.as_ref().filter(|d| d.date == date)?;
        let hourly = self.hourly_weather_data.as_ref().filter(|h| h.date == date)?;
        Some(EnvironmentalForecast {
            date,
            daily: daily.signal,
            hourly: hourly.samples.clone(),
        })
    }

    /// Millilitres still needed today
    pub fn remaining_ml(&self) -> i64 {
        (self.daily_water_target - self.water_intake).max(0)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.daily_water_target <= 0 {
            return 0.0;
        }
        (self.water_intake as f64 / self.daily_water_target as f64) * 100.0
    }

    pub fn custom_interval(&self) -> Duration {
        let minutes = (self.custom_interval_hours * 60.0).round() as i64;
        Duration::minutes(minutes.max(30))
    }
}

// ============================================================================
// Supplements
// ============================================================================

/// Supplement document (`users/{uid}/supplements/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementItem {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub daily_usage: i64,
    #[serde(default)]
    pub notification_schedule: Option<Vec<ClockTime>>,
    #[serde(default)]
    pub next_supplement_reminder_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notifications_last_calculated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_times: Vec<ReminderEvent>,
}

/// How a supplement's reminders are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplementStrategy<'a> {
    /// User-entered clock times
    Manual(&'a [ClockTime]),
    /// Derived from remaining stock
    Automatic,
}

impl SupplementItem {
    pub fn strategy(&self) -> SupplementStrategy<'_> {
        match self.notification_schedule.as_deref() {
            Some(slots) if !slots.is_empty() => SupplementStrategy::Manual(slots),
            _ => SupplementStrategy::Automatic,
        }
    }

    /// Counted in summaries only while stocked and in use
    pub fn is_active(&self) -> bool {
        self.quantity > 0 && self.daily_usage > 0
    }

    /// Whole days of stock left at the current usage
    pub fn remaining_days(&self) -> i64 {
        if self.daily_usage <= 0 {
            return 0;
        }
        self.quantity.max(0) / self.daily_usage
    }

    /// Stored reminder slots strictly after `after`, in stored order
    pub fn reminders_after(&self, after: DateTime<Utc>) -> Vec<ReminderEvent> {
        self.reminder_times
            .iter()
            .filter(|r| r.time > after)
            .cloned()
            .collect()
    }
}

/// Per-day consumption counts (`users/{uid}/supplementStats/{YYYY-MM-DD}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumptionStats(pub BTreeMap<String, i64>);

impl ConsumptionStats {
    pub fn consumed(&self, name: &str) -> i64 {
        self.0.get(name).copied().unwrap_or(0).max(0)
    }

    pub fn increment(&mut self, name: &str, by: i64) {
        *self.0.entry(name.to_string()).or_insert(0) += by;
    }
}

// ============================================================================
// Ancillary trigger sources
// ============================================================================

/// A routine item for a given day (`users/{uid}/routines/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    #[serde(default)]
    pub end_time: Option<ClockTime>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default = "enabled")]
    pub notification_enabled: bool,
}

/// A countdown timer (`users/{uid}/timers/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub ends_at: DateTime<Utc>,
    #[serde(default = "enabled")]
    pub active: bool,
}

fn enabled() -> bool {
    true
}

/// How far ahead of a calendar event to notify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CalendarLead {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "on-time")]
    OnTime,
    #[serde(rename = "15-minutes")]
    FifteenMinutes,
    #[serde(rename = "1-hour")]
    OneHour,
    #[serde(rename = "1-day")]
    OneDay,
}

impl CalendarLead {
    /// Offset before the event start, or `None` when disabled
    pub fn offset(&self) -> Option<Duration> {
        match self {
            CalendarLead::None => None,
            CalendarLead::OnTime => Some(Duration::zero()),
            CalendarLead::FifteenMinutes => Some(Duration::minutes(15)),
            CalendarLead::OneHour => Some(Duration::hours(1)),
            CalendarLead::OneDay => Some(Duration::days(1)),
        }
    }
}

/// A calendar entry (`users/{uid}/calendarEvents/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub notification: CalendarLead,
}
