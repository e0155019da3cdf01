//! Due-event detection
//!
//! Every trigger category shares one primitive: a target instant is due when
//! it lies within the trigger tolerance of "now". Water and supplement
//! reminders are additionally gated by the user's notification window.

use crate::messages::{
    self, calendar_event, routine_end, routine_start, timer_finished, NotificationContent,
    SupplementProgress,
};
use crate::models::{
    CalendarEvent, ConsumptionStats, Routine, SupplementItem, Timer, User, WaterReminderMode,
    WaterState,
};
use crate::supplement_schedule::summary_time;
use crate::time::{SchedulerSettings, TimeContext};
use crate::window::NotificationWindow;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of notification a trigger produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    RoutineStart,
    RoutineEnd,
    Timer,
    CalendarEvent,
    WaterReminder,
    SupplementReminder,
    WaterSummary,
    SupplementSummary,
}

impl TriggerCategory {
    /// Only water and supplement reminders respect the notification window
    pub fn is_window_gated(&self) -> bool {
        matches!(
            self,
            TriggerCategory::WaterReminder | TriggerCategory::SupplementReminder
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerCategory::RoutineStart => "routine_start",
            TriggerCategory::RoutineEnd => "routine_end",
            TriggerCategory::Timer => "timer",
            TriggerCategory::CalendarEvent => "calendar_event",
            TriggerCategory::WaterReminder => "water_reminder",
            TriggerCategory::SupplementReminder => "supplement_reminder",
            TriggerCategory::WaterSummary => "water_summary",
            TriggerCategory::SupplementSummary => "supplement_summary",
        }
    }
}

/// A notification that should go out now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueNotification {
    pub category: TriggerCategory,
    /// Routine, timer, event or supplement id the notification came from
    pub source_id: Option<String>,
    pub content: NotificationContent,
}

impl DueNotification {
    fn new(category: TriggerCategory, source_id: Option<&str>, content: NotificationContent) -> Self {
        Self {
            category,
            source_id: source_id.map(str::to_string),
            content,
        }
    }
}

/// Outcome of checking one supplement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplementDue {
    NotDue,
    /// Due, but today's consumption already meets daily usage
    Suppressed { consumed: i64 },
    Due(DueNotification),
}

/// |target - now| <= tolerance
pub fn is_due(target: DateTime<Utc>, now: DateTime<Utc>, tolerance: Duration) -> bool {
    (target - now).abs() <= tolerance
}

/// Decides which events fire for one user at one instant
#[derive(Debug, Clone, Copy)]
pub struct TriggerEvaluator {
    ctx: TimeContext,
    settings: SchedulerSettings,
}

impl TriggerEvaluator {
    pub fn new(ctx: TimeContext, settings: SchedulerSettings) -> Self {
        Self { ctx, settings }
    }

    fn due(&self, target: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_due(target, now, self.settings.trigger_tolerance)
    }

    /// Gated categories fire only inside today's window, with tolerance slack
    fn passes_window(
        &self,
        category: TriggerCategory,
        window: &NotificationWindow,
        now: DateTime<Utc>,
    ) -> bool {
        !category.is_window_gated()
            || window
                .resolve(&self.ctx, now)
                .contains_with_slack(now, self.settings.trigger_tolerance)
    }

    /// Start and end of today's unchecked routines
    pub fn routines(&self, routines: &[Routine], now: DateTime<Utc>) -> Vec<DueNotification> {
        let today = self.ctx.local_date(now);
        let mut due = Vec::new();

        for routine in routines
            .iter()
            .filter(|r| r.date == today && !r.checked && r.notification_enabled)
        {
            if self.due(self.ctx.at(today, routine.start_time.as_naive()), now) {
                due.push(DueNotification::new(
                    TriggerCategory::RoutineStart,
                    Some(&routine.id),
                    routine_start(&routine.title),
                ));
            }
            if let Some(end) = routine.end_time {
                if self.due(self.ctx.at(today, end.as_naive()), now) {
                    due.push(DueNotification::new(
                        TriggerCategory::RoutineEnd,
                        Some(&routine.id),
                        routine_end(&routine.title),
                    ));
                }
            }
        }
        due
    }

    pub fn timers(&self, timers: &[Timer], now: DateTime<Utc>) -> Vec<DueNotification> {
        timers
            .iter()
            .filter(|t| t.active && self.due(t.ends_at, now))
            .map(|t| DueNotification::new(TriggerCategory::Timer, Some(&t.id), timer_finished(&t.label)))
            .collect()
    }

    pub fn calendar(&self, events: &[CalendarEvent], now: DateTime<Utc>) -> Vec<DueNotification> {
        events
            .iter()
            .filter_map(|event| {
                let lead = event.notification.offset()?;
                if !self.due(event.start - lead, now) {
                    return None;
                }
                Some(DueNotification::new(
                    TriggerCategory::CalendarEvent,
                    Some(&event.id),
                    calendar_event(&event.title, lead.num_minutes()),
                ))
            })
            .collect()
    }

    pub fn water_reminder(
        &self,
        water: &WaterState,
        window: &NotificationWindow,
        now: DateTime<Utc>,
    ) -> Option<DueNotification> {
        if water.water_notification_option == WaterReminderMode::None {
            return None;
        }
        let next = water.next_water_reminder_time?;
        if !self.due(next, now) {
            return None;
        }
        if !self.passes_window(TriggerCategory::WaterReminder, window, now) {
            return None;
        }
        Some(DueNotification::new(
            TriggerCategory::WaterReminder,
            None,
            messages::water_reminder(water.next_water_reminder_message.as_deref()),
        ))
    }

    pub fn supplement_reminder(
        &self,
        item: &SupplementItem,
        consumed_today: i64,
        window: &NotificationWindow,
        now: DateTime<Utc>,
    ) -> SupplementDue {
        let Some(next) = item.next_supplement_reminder_time else {
            return SupplementDue::NotDue;
        };
        if !self.due(next, now)
            || !self.passes_window(TriggerCategory::SupplementReminder, window, now)
        {
            return SupplementDue::NotDue;
        }
        if item.daily_usage > 0 && consumed_today >= item.daily_usage {
            return SupplementDue::Suppressed {
                consumed: consumed_today,
            };
        }

        let content = match item.reminder_times.first().filter(|r| r.time == next) {
            Some(reminder) => {
                NotificationContent::new(messages::supplement_reminder(&item.name).title, &reminder.message)
            }
            None => messages::supplement_reminder(&item.name),
        };
        SupplementDue::Due(DueNotification::new(
            TriggerCategory::SupplementReminder,
            Some(&item.id),
            content,
        ))
    }

    /// Local midnight within tolerance of `now`, if any
    ///
    /// Returns the date that begins at that midnight.
    pub fn midnight_near(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = self.ctx.local_date(now);
        [today, today.succ_opt().unwrap_or(today)]
            .into_iter()
            .find(|d| self.due(self.ctx.start_of_day(*d), now))
    }

    /// Summary of the day that ended at the nearest midnight
    ///
    /// `water` must come from a fresh read. When the rollover has already
    /// run, the carried-over intake is used instead of the zeroed counter.
    pub fn water_summary(
        &self,
        user: &User,
        water: &WaterState,
        now: DateTime<Utc>,
    ) -> Option<(NaiveDate, DueNotification)> {
        let new_day = self.midnight_near(now)?;
        let summarized = new_day.pred_opt().unwrap_or(new_day);
        if user.last_water_summary_date == Some(summarized) {
            return None;
        }

        let (intake, target) = if water.last_reset_date == Some(new_day) {
            (
                water.yesterday_water_intake.unwrap_or(0),
                water.yesterday_water_target.unwrap_or(water.daily_water_target),
            )
        } else {
            (water.water_intake, water.daily_water_target)
        };

        Some((
            summarized,
            DueNotification::new(
                TriggerCategory::WaterSummary,
                None,
                messages::water_summary(intake, target),
            ),
        ))
    }

    /// Local date whose supplement summary is due now and not yet sent
    pub fn supplement_summary_date(&self, user: &User, now: DateTime<Utc>) -> Option<NaiveDate> {
        let time: NaiveTime = summary_time(user.notification_window.as_ref());
        if !self.due(self.ctx.today_at(now, time), now) {
            return None;
        }
        let today = self.ctx.local_date(now);
        (user.last_supplement_summary_date != Some(today)).then_some(today)
    }

    /// End-of-window supplement summary, once per local date
    ///
    /// `supplements` and `stats` must come from fresh reads.
    pub fn supplement_summary(
        &self,
        user: &User,
        supplements: &[SupplementItem],
        stats: &ConsumptionStats,
        now: DateTime<Utc>,
    ) -> Option<(NaiveDate, DueNotification)> {
        let today = self.supplement_summary_date(user, now)?;

        let active: Vec<&SupplementItem> = supplements.iter().filter(|s| s.is_active()).collect();
        if active.is_empty() {
            return None;
        }

        let incomplete: Vec<SupplementProgress> = active
            .iter()
            .filter(|s| stats.consumed(&s.name) < s.daily_usage)
            .map(|s| SupplementProgress {
                name: s.name.clone(),
                consumed: stats.consumed(&s.name),
                daily_usage: s.daily_usage,
            })
            .collect();

        Some((
            today,
            DueNotification::new(
                TriggerCategory::SupplementSummary,
                None,
                messages::supplement_summary(&incomplete),
            ),
        ))
    }
}
