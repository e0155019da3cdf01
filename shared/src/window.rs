//! Notification window resolution
//!
//! A window is configured as two local clock times. Resolving it against an
//! instant yields the absolute interval that instant belongs to (or the one
//! for the current local day), with overnight windows spanning two dates.

use crate::time::{ClockTime, TimeContext};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily window in which reminders may be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationWindow {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Default for NotificationWindow {
    /// 07:00 to 22:00
    fn default() -> Self {
        Self {
            start: ClockTime::from(NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN)),
            end: ClockTime::from(NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN)),
        }
    }
}

/// Absolute bounds of one occurrence of a [`NotificationWindow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ResolvedWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Like [`contains`](Self::contains) but widened by `slack` on both ends
    pub fn contains_with_slack(&self, instant: DateTime<Utc>, slack: Duration) -> bool {
        instant >= self.start - slack && instant <= self.end + slack
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl NotificationWindow {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// True when the window runs past local midnight
    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// True when start and end coincide, which denotes a 24-hour window
    pub fn is_full_day(&self) -> bool {
        self.start == self.end
    }

    /// Resolve the window occurrence relevant to `now`
    ///
    /// - `start < end`: both bounds fall on today's local date.
    /// - `start > end`: if `now` is before today's end the window began
    ///   yesterday, otherwise it begins today and ends tomorrow.
    /// - `start == end`: 24 hours from the most recent occurrence of `start`.
    pub fn resolve(&self, ctx: &TimeContext, now: DateTime<Utc>) -> ResolvedWindow {
        let today = ctx.local_date(now);
        let start = self.start.as_naive();
        let end = self.end.as_naive();

        if self.is_full_day() {
            let start_today = ctx.at(today, start);
            let window_start = if now >= start_today {
                start_today
            } else {
                start_today - Duration::days(1)
            };
            return ResolvedWindow {
                start: window_start,
                end: window_start + Duration::days(1),
            };
        }

        if !self.is_overnight() {
            return ResolvedWindow {
                start: ctx.at(today, start),
                end: ctx.at(today, end),
            };
        }

        let end_today = ctx.at(today, end);
        if now < end_today {
            ResolvedWindow {
                start: ctx.at(previous_day(today), start),
                end: end_today,
            }
        } else {
            ResolvedWindow {
                start: ctx.at(today, start),
                end: ctx.at(next_day(today), end),
            }
        }
    }

    /// The occurrence that opens on `date`
    pub fn resolve_on(&self, ctx: &TimeContext, date: NaiveDate) -> ResolvedWindow {
        let start = ctx.at(date, self.start.as_naive());
        let end = if self.is_overnight() || self.is_full_day() {
            ctx.at(next_day(date), self.end.as_naive())
        } else {
            ctx.at(date, self.end.as_naive())
        };
        ResolvedWindow { start, end }
    }

    /// The occurrence immediately after `current`
    pub fn following(&self, ctx: &TimeContext, current: &ResolvedWindow) -> ResolvedWindow {
        self.resolve_on(ctx, next_day(ctx.local_date(current.start)))
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ctx() -> TimeContext {
        TimeContext::default()
    }

    fn window(start: &str, end: &str) -> NotificationWindow {
        NotificationWindow::new(start.parse().unwrap(), end.parse().unwrap())
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        let date = NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        ctx().at(date, NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_default_window() {
        let w = NotificationWindow::default();
        assert_eq!(w.start.to_string(), "07:00");
        assert_eq!(w.end.to_string(), "22:00");
    }

    #[test]
    fn test_same_day_window() {
        let resolved = window("08:00", "22:00").resolve(&ctx(), local(10, 9, 0));
        assert_eq!(resolved.start, local(10, 8, 0));
        assert_eq!(resolved.end, local(10, 22, 0));
    }

    #[test]
    fn test_overnight_window_after_midnight() {
        // 22:00-06:00 at 02:00 local started yesterday
        let resolved = window("22:00", "06:00").resolve(&ctx(), local(10, 2, 0));
        assert_eq!(resolved.start, local(9, 22, 0));
        assert_eq!(resolved.end, local(10, 6, 0));
        assert!(resolved.contains(local(10, 2, 0)));
    }

    #[test]
    fn test_overnight_window_before_midnight() {
        let resolved = window("22:00", "06:00").resolve(&ctx(), local(10, 23, 0));
        assert_eq!(resolved.start, local(10, 22, 0));
        assert_eq!(resolved.end, local(11, 6, 0));
    }

    #[test]
    fn test_full_day_window() {
        let resolved = window("09:00", "09:00").resolve(&ctx(), local(10, 8, 0));
        assert_eq!(resolved.start, local(9, 9, 0));
        assert_eq!(resolved.end, local(10, 9, 0));
        assert_eq!(resolved.duration(), Duration::days(1));
    }

    #[test]
    fn test_following_window() {
        let w = window("08:00", "22:00");
        let current = w.resolve(&ctx(), local(10, 23, 0));
        let next = w.following(&ctx(), &current);
        assert_eq!(next.start, local(11, 8, 0));
        assert_eq!(next.end, local(11, 22, 0));
    }

    #[test]
    fn test_contains_with_slack() {
        let resolved = window("08:00", "22:00").resolve(&ctx(), local(10, 9, 0));
        let just_after = local(10, 22, 0) + Duration::seconds(20);
        assert!(!resolved.contains(just_after));
        assert!(resolved.contains_with_slack(just_after, Duration::seconds(30)));
    }

    #[test]
    fn test_window_round_trips_as_strings() {
        let json = serde_json::json!({"start": "22:30", "end": "06:15"});
        let w: NotificationWindow = serde_json::from_value(json).unwrap();
        assert!(w.is_overnight());
        assert_eq!(w.start.to_string(), "22:30");
    }

    // Feature: wellness-tracker, Property 1: Window resolution
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_resolved_window_is_ordered_and_contains_now_when_inside(
            start_min in 0u32..1440,
            end_min in 0u32..1440,
            now_offset_secs in 0i64..(3 * 86_400),
        ) {
            let w = NotificationWindow::new(
                ClockTime::new(start_min / 60, start_min % 60).unwrap(),
                ClockTime::new(end_min / 60, end_min % 60).unwrap(),
            );
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let now = base + Duration::seconds(now_offset_secs);
            let resolved = w.resolve(&ctx(), now);

            prop_assert!(resolved.end > resolved.start);

            // Whenever the local clock lies inside the configured span,
            // the resolved occurrence must contain now.
            let t = ctx().local_time(now);
            let (s, e) = (w.start.as_naive(), w.end.as_naive());
            let inside = if w.is_full_day() {
                true
            } else if w.is_overnight() {
                t >= s || t < e
            } else {
                t >= s && t < e
            };
            if inside {
                prop_assert!(resolved.contains(now),
                    "window {}-{} resolved to {:?} does not contain {}", w.start, w.end, resolved, now);
            }
        }
    }
}
