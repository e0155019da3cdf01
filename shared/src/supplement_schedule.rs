//! Supplement reminder scheduling
//!
//! One authoritative function decides the reminder(s) for a supplement.
//! It is called when schedules are recomputed and again by the trigger
//! path after a manual slot fires, so both agree on the next slot.
//!
//! Order of evaluation:
//! 1. Suppression when today's consumption already meets daily usage
//! 2. Run-out reminder when the stock is empty (overrides manual slots)
//! 3. Manual clock times, or the automatic stock-based strategy

use crate::messages::{
    supplement_daily, supplement_low_stock, supplement_reminder, supplement_run_out,
};
use crate::models::{ReminderEvent, SupplementItem, SupplementStrategy};
use crate::time::{ClockTime, SchedulerSettings, TimeContext};
use crate::window::NotificationWindow;
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Remaining-day counts that get a heads-up at the end of the window
pub const LOW_STOCK_MILESTONES: [i64; 4] = [14, 7, 3, 1];

/// Why a plan looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanReason {
    /// Daily usage is zero or negative
    Inactive,
    Suppressed { consumed: i64, daily_usage: i64 },
    RunOut,
    Manual,
    LowStock { remaining_days: i64 },
    DailySummary { remaining_days: i64 },
}

/// Reminders for one supplement
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementPlan {
    pub reminders: Vec<ReminderEvent>,
    pub reason: PlanReason,
}

impl SupplementPlan {
    fn empty(reason: PlanReason) -> Self {
        Self {
            reminders: Vec::new(),
            reason,
        }
    }

    fn single(time: DateTime<Utc>, message: String, reason: PlanReason) -> Self {
        Self {
            reminders: vec![ReminderEvent::new(time, message)],
            reason,
        }
    }

    pub fn next(&self) -> Option<&ReminderEvent> {
        self.reminders.first()
    }
}

/// Local time of the daily supplement summary
///
/// One minute before the window closes when it closes before midnight on the
/// day it opened; 23:59 otherwise.
pub fn summary_time(window: Option<&NotificationWindow>) -> NaiveTime {
    let last_minute = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
    match window {
        Some(w) if !w.is_overnight() && !w.is_full_day() => {
            w.end.as_naive() - Duration::minutes(1)
        }
        _ => last_minute,
    }
}

/// Computes supplement reminder plans
#[derive(Debug, Clone, Copy)]
pub struct SupplementReminderScheduler {
    ctx: TimeContext,
    settings: SchedulerSettings,
}

impl SupplementReminderScheduler {
    pub fn new(ctx: TimeContext, settings: SchedulerSettings) -> Self {
        Self { ctx, settings }
    }

    pub fn plan(
        &self,
        item: &SupplementItem,
        consumed_today: i64,
        window: Option<&NotificationWindow>,
        now: DateTime<Utc>,
    ) -> SupplementPlan {
        if item.daily_usage <= 0 {
            return SupplementPlan::empty(PlanReason::Inactive);
        }

        if consumed_today >= item.daily_usage {
            return SupplementPlan::empty(PlanReason::Suppressed {
                consumed: consumed_today,
                daily_usage: item.daily_usage,
            });
        }

        if item.quantity <= 0 {
            return self.run_out(item, now);
        }

        match item.strategy() {
            SupplementStrategy::Manual(slots) => {
                let message = supplement_reminder(&item.name).body;
                SupplementPlan {
                    reminders: self
                        .expand_manual(slots, now)
                        .into_iter()
                        .map(|t| ReminderEvent::new(t, message.clone()))
                        .collect(),
                    reason: PlanReason::Manual,
                }
            }
            SupplementStrategy::Automatic => self.automatic(item, window, now),
        }
    }

    /// Each clock time today, or tomorrow once it is no longer ahead of the margin
    pub fn expand_manual(&self, slots: &[ClockTime], now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let today = self.ctx.local_date(now);
        let tomorrow = today.succ_opt().unwrap_or(today);
        let earliest = self.settings.earliest_slot(now);

        let mut times: Vec<_> = slots
            .iter()
            .map(|slot| {
                let candidate = self.ctx.at(today, slot.as_naive());
                if candidate > earliest {
                    candidate
                } else {
                    self.ctx.at(tomorrow, slot.as_naive())
                }
            })
            .collect();
        times.sort();
        times.dedup();
        times
    }

    fn run_out(&self, item: &SupplementItem, now: DateTime<Utc>) -> SupplementPlan {
        let at = self.settings.earliest_slot(now) + Duration::seconds(1);
        SupplementPlan::single(at, supplement_run_out(&item.name), PlanReason::RunOut)
    }

    fn automatic(
        &self,
        item: &SupplementItem,
        window: Option<&NotificationWindow>,
        now: DateTime<Utc>,
    ) -> SupplementPlan {
        let remaining_days = item.remaining_days();
        if remaining_days == 0 {
            return self.run_out(item, now);
        }

        if LOW_STOCK_MILESTONES.contains(&remaining_days) {
            let at = self.window_end_after(window, now);
            return SupplementPlan::single(
                at,
                supplement_low_stock(&item.name, remaining_days),
                PlanReason::LowStock { remaining_days },
            );
        }

        SupplementPlan::single(
            self.summary_instant(window, now),
            supplement_daily(&item.name),
            PlanReason::DailySummary { remaining_days },
        )
    }

    fn window_end_after(&self, window: Option<&NotificationWindow>, now: DateTime<Utc>) -> DateTime<Utc> {
        let Some(window) = window else {
            return now + Duration::hours(1);
        };
        let current = window.resolve(&self.ctx, now);
        if current.end > self.settings.earliest_slot(now) {
            current.end
        } else {
            window.following(&self.ctx, &current).end
        }
    }

    /// Next occurrence of the summary time
    ///
    /// Between 23:58 and midnight a 23:59 slot stays on today even inside
    /// the margin, so the day's summary is not pushed to tomorrow.
    pub fn summary_instant(&self, window: Option<&NotificationWindow>, now: DateTime<Utc>) -> DateTime<Utc> {
        let time = summary_time(window);
        let today_slot = self.ctx.today_at(now, time);
        if today_slot > self.settings.earliest_slot(now) {
            return today_slot;
        }
        if self.in_midnight_tolerance(time, now) {
            return today_slot;
        }
        let tomorrow = self.ctx.local_date(now).succ_opt().unwrap_or(self.ctx.local_date(now));
        self.ctx.at(tomorrow, time)
    }

    fn in_midnight_tolerance(&self, slot: NaiveTime, now: DateTime<Utc>) -> bool {
        let last_minute = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
        let tolerance_start = NaiveTime::from_hms_opt(23, 58, 0).unwrap_or(NaiveTime::MIN);
        slot == last_minute && self.ctx.local_time(now) >= tolerance_start
    }
}
