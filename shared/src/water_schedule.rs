//! Water reminder scheduling
//!
//! Produces the ordered list of reminder instants for one user under the
//! configured [`WaterReminderMode`]. Every mode finishes with the same
//! post-processing: drop slots at or before `now + margin`, sort, dedupe.

use crate::environment::EnvironmentalForecast;
use crate::health_metrics::ActivityLevel;
use crate::interval::{
    base_interval_minutes, critical_interval_minutes, daily_water_target, glass_count,
};
use crate::messages::water_reminder_message;
use crate::models::{ReminderEvent, WaterReminderMode};
use crate::time::{SchedulerSettings, TimeContext};
use crate::window::NotificationWindow;
use chrono::{DateTime, Duration, Utc};

/// Shortest step for custom mode during critical hours
const MIN_CUSTOM_CRITICAL_STEP_MINUTES: i64 = 30;

/// Everything the water scheduler needs about one user
#[derive(Debug, Clone)]
pub struct WaterPlanInput<'a> {
    pub mode: WaterReminderMode,
    pub intake_ml: i64,
    /// Target currently stored on the water document
    pub stored_target_ml: i64,
    pub glass_size_ml: i64,
    pub custom_interval: Duration,
    pub bmr: f64,
    pub activity: ActivityLevel,
    pub forecast: &'a EnvironmentalForecast,
    pub window: NotificationWindow,
}

/// Result of one scheduling pass
#[derive(Debug, Clone, PartialEq)]
pub struct WaterPlan {
    pub reminders: Vec<ReminderEvent>,
    /// Target to persist; recomputed in smart mode, carried otherwise
    pub daily_target_ml: i64,
    pub glass_count: i64,
}

impl WaterPlan {
    pub fn next(&self) -> Option<&ReminderEvent> {
        self.reminders.first()
    }
}

/// Computes water reminder schedules
#[derive(Debug, Clone, Copy)]
pub struct WaterReminderScheduler {
    ctx: TimeContext,
    settings: SchedulerSettings,
}

impl WaterReminderScheduler {
    pub fn new(ctx: TimeContext, settings: SchedulerSettings) -> Self {
        Self { ctx, settings }
    }

    pub fn schedule(&self, input: &WaterPlanInput<'_>, now: DateTime<Utc>) -> WaterPlan {
        let (raw, target) = match input.mode {
            WaterReminderMode::None => (Vec::new(), input.stored_target_ml),
            WaterReminderMode::Smart => self.smart(input, now),
            WaterReminderMode::Custom => (self.custom(input, now), input.stored_target_ml),
        };

        let remaining = (target - input.intake_ml).max(0);
        WaterPlan {
            reminders: finalize(raw, self.settings.earliest_slot(now)),
            daily_target_ml: target,
            glass_count: glass_count(remaining, input.glass_size_ml),
        }
    }

    fn smart(&self, input: &WaterPlanInput<'_>, now: DateTime<Utc>) -> (Vec<ReminderEvent>, i64) {
        let target = daily_water_target(input.bmr, &input.forecast.daily, input.activity);
        let window = input.window.resolve(&self.ctx, now);
        let remaining_ml = target - input.intake_ml;

        if remaining_ml <= 0 || now > window.end {
            return (Vec::new(), target);
        }

        let start = now.max(window.start);
        let remaining_minutes = (window.end - start).num_minutes();
        if remaining_minutes <= 0 {
            return (Vec::new(), target);
        }

        let glasses = glass_count(remaining_ml, input.glass_size_ml);
        let base = base_interval_minutes(remaining_minutes, glasses);

        // First slot at the later of window start and now; finalize drops it
        // when it falls inside the margin.
        let first_hour = self.ctx.local_hour(start);
        let mut slots = vec![ReminderEvent::new(
            start,
            water_reminder_message(input.forecast.sample_at(first_hour), first_hour, 0),
        )];
        let mut cursor = start;
        loop {
            let hour = self.ctx.local_hour(cursor);
            let step = if input.forecast.is_critical_hour(hour) {
                critical_interval_minutes(base)
            } else {
                base
            };
            cursor += Duration::minutes(step);
            if cursor > window.end {
                break;
            }
            let slot_hour = self.ctx.local_hour(cursor);
            let message =
                water_reminder_message(input.forecast.sample_at(slot_hour), slot_hour, slots.len());
            slots.push(ReminderEvent::new(cursor, message));
        }

        (slots, target)
    }

    fn custom(&self, input: &WaterPlanInput<'_>, now: DateTime<Utc>) -> Vec<ReminderEvent> {
        let interval = input
            .custom_interval
            .max(Duration::minutes(MIN_CUSTOM_CRITICAL_STEP_MINUTES));
        let today = input.window.resolve(&self.ctx, now);

        let (window, first) = if now < today.start {
            (today, today.start)
        } else if now <= today.end && now + interval <= today.end {
            (today, now + interval)
        } else {
            let next = input.window.following(&self.ctx, &today);
            (next, next.start)
        };

        let critical_step =
            (interval / 2).max(Duration::minutes(MIN_CUSTOM_CRITICAL_STEP_MINUTES));

        let mut slots = Vec::new();
        let mut cursor = first;
        while cursor <= window.end {
            let hour = self.ctx.local_hour(cursor);
            let message = water_reminder_message(input.forecast.sample_at(hour), hour, slots.len());
            slots.push(ReminderEvent::new(cursor, message));

            let step = if input.forecast.is_critical_hour(hour) {
                critical_step
            } else {
                interval
            };
            cursor += step;
        }
        slots
    }
}

/// Drop slots at or before `earliest`, then sort and dedupe by instant
pub fn finalize(mut slots: Vec<ReminderEvent>, earliest: DateTime<Utc>) -> Vec<ReminderEvent> {
    slots.retain(|slot| slot.time > earliest);
    slots.sort_by_key(|slot| slot.time);
    slots.dedup_by_key(|slot| slot.time);
    slots
}
