//! Notification texts

use crate::environment::EnvironmentalSignal;
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 64;
const BODY_MAX_CHARS: usize = 240;

/// Title and body of a push notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    pub fn new(title: impl AsRef<str>, body: impl AsRef<str>) -> Self {
        Self {
            title: truncate_for_notification(title.as_ref(), TITLE_MAX_CHARS),
            body: truncate_for_notification(body.as_ref(), BODY_MAX_CHARS),
        }
    }
}

/// Part of the day a water reminder falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=9 => TimeOfDay::Morning,
            10..=13 => TimeOfDay::Midday,
            14..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    fn tips(&self) -> &'static [&'static str] {
        match self {
            TimeOfDay::Morning => &[
                "Good morning! Start the day with a glass of water.",
                "A glass of water now wakes up your metabolism.",
                "Morning hydration sets the tone for the day.",
            ],
            TimeOfDay::Midday => &[
                "Midday check: time for a glass of water.",
                "Keep your focus sharp, have some water.",
                "A glass before lunch helps digestion.",
            ],
            TimeOfDay::Afternoon => &[
                "Afternoon slump? Water helps more than coffee.",
                "Time for a refreshing glass of water.",
                "Stay on track with your afternoon glass.",
            ],
            TimeOfDay::Evening => &[
                "Evening reminder: a glass of water keeps you on target.",
                "Almost there for today, have a glass of water.",
                "Wind down with a glass of water.",
            ],
            TimeOfDay::Night => &[
                "A small glass of water before resting.",
                "Late hours: a few sips of water are enough.",
            ],
        }
    }
}

/// Context-aware water reminder text
///
/// Conditions of the slot's hour take precedence; otherwise a tip for the
/// time of day is picked, rotating with `slot_index`.
pub fn water_reminder_message(
    signal: Option<&EnvironmentalSignal>,
    local_hour: u32,
    slot_index: usize,
) -> String {
    if let Some(signal) = signal {
        if signal.temperature > 28.0 {
            return format!(
                "It's {:.0}°C outside. Drink a glass of water to stay cool.",
                signal.temperature
            );
        }
        if signal.humidity > 75.0 {
            return "High humidity makes you sweat more. Time for water.".to_string();
        }
        if signal.uv_index > 6.0 {
            return "Strong sun today. Stay hydrated with a glass of water.".to_string();
        }
        if signal.wind_speed > 15.0 {
            return "Windy weather dries you out. Have a glass of water.".to_string();
        }
    }

    let tips = TimeOfDay::from_hour(local_hour).tips();
    tips[slot_index % tips.len()].to_string()
}

pub fn water_reminder(message: Option<&str>) -> NotificationContent {
    NotificationContent::new(
        "Time to drink water 💧",
        message.unwrap_or("Have a glass of water to stay on track."),
    )
}

/// Midnight summary of the day that just ended
pub fn water_summary(intake_ml: i64, target_ml: i64) -> NotificationContent {
    if target_ml > 0 && intake_ml >= target_ml {
        NotificationContent::new(
            "Daily water goal reached 🎉",
            format!(
                "You drank {} ml of your {} ml target yesterday. Great job!",
                intake_ml, target_ml
            ),
        )
    } else {
        let missing = (target_ml - intake_ml).max(0);
        NotificationContent::new(
            "Daily water summary",
            format!(
                "You drank {} ml of your {} ml target, {} ml short. A fresh start today!",
                intake_ml, target_ml, missing
            ),
        )
    }
}

/// Line item for the supplement summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementProgress {
    pub name: String,
    pub consumed: i64,
    pub daily_usage: i64,
}

/// End-of-window supplement summary
pub fn supplement_summary(incomplete: &[SupplementProgress]) -> NotificationContent {
    if incomplete.is_empty() {
        return NotificationContent::new(
            "Supplements complete ✅",
            "You took all of your supplements today.",
        );
    }
    let items = incomplete
        .iter()
        .map(|p| format!("{} ({}/{})", p.name, p.consumed, p.daily_usage))
        .collect::<Vec<_>>()
        .join(", ");
    NotificationContent::new(
        "Supplements left for today",
        format!("Not taken yet: {}", items),
    )
}

pub fn supplement_reminder(name: &str) -> NotificationContent {
    NotificationContent::new(
        "Supplement reminder 💊",
        format!("Time to take your {}.", name),
    )
}

pub fn supplement_run_out(name: &str) -> String {
    format!("{} is about to run out. Time to restock.", name)
}

pub fn supplement_low_stock(name: &str, remaining_days: i64) -> String {
    if remaining_days == 1 {
        format!("{} runs out tomorrow.", name)
    } else {
        format!("{} will run out in {} days.", name, remaining_days)
    }
}

pub fn supplement_daily(name: &str) -> String {
    format!("Did you take your {} today?", name)
}

pub fn routine_start(title: &str) -> NotificationContent {
    NotificationContent::new(format!("Reminder: {}", title), "Your routine is starting now.")
}

pub fn routine_end(title: &str) -> NotificationContent {
    NotificationContent::new(format!("Reminder: {}", title), "Your routine is ending now.")
}

pub fn timer_finished(label: &str) -> NotificationContent {
    let title = if label.trim().is_empty() {
        "Timer finished"
    } else {
        label
    };
    NotificationContent::new(title, "Your timer is done.")
}

pub fn calendar_event(title: &str, lead_minutes: i64) -> NotificationContent {
    let body = match lead_minutes {
        0 => "Starting now.".to_string(),
        m if m >= 1440 => "Starts tomorrow at this time.".to_string(),
        m if m >= 60 => format!("Starts in {} hour(s).", m / 60),
        m => format!("Starts in {} minutes.", m),
    };
    NotificationContent::new(title, body)
}

fn truncate_for_notification(value: &str, max_chars: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
