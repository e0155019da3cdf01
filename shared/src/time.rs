//! Local-time arithmetic
//!
//! Every user shares one fixed UTC offset. Instants are carried as
//! `DateTime<Utc>`; calendar dates and clock times are derived through
//! [`TimeContext`] so that "today" means the same thing everywhere.

use crate::errors::DomainError;
use crate::validation::parse_clock_time;
use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

/// Default offset: UTC+03:00, no daylight saving
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 180;

/// Largest offset accepted, in minutes either side of UTC
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Resolves instants into the configured local timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeContext {
    offset: FixedOffset,
}

impl Default for TimeContext {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or(Self { offset: Utc.fix() })
    }
}

impl TimeContext {
    /// Build a context for a fixed offset east of UTC
    pub fn new(offset_minutes: i32) -> Result<Self, DomainError> {
        if offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(DomainError::InvalidOffset(offset_minutes));
        }
        FixedOffset::east_opt(offset_minutes * 60)
            .map(|offset| Self { offset })
            .ok_or(DomainError::InvalidOffset(offset_minutes))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// Calendar date of `instant` in local time
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Wall-clock time of `instant` in local time
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        self.to_local(instant).time()
    }

    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        self.local_time(instant).hour()
    }

    /// The instant at which the local clock shows `time` on `date`
    ///
    /// A fixed offset has no gaps or folds, so this is always unambiguous.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time);
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// Local midnight at the start of `date`
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.at(date, NaiveTime::MIN)
    }

    /// `time` on the same local date as `now`
    pub fn today_at(&self, now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
        self.at(self.local_date(now), time)
    }
}

/// Tolerances shared by the schedulers and the trigger evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// How far a stored reminder time may be from "now" and still fire
    pub trigger_tolerance: Duration,
    /// Slots at or before `now + schedule_margin` are never persisted
    pub schedule_margin: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            trigger_tolerance: Duration::seconds(30),
            schedule_margin: Duration::seconds(60),
        }
    }
}

impl SchedulerSettings {
    pub fn from_secs(trigger_tolerance_secs: i64, schedule_margin_secs: i64) -> Self {
        Self {
            trigger_tolerance: Duration::seconds(trigger_tolerance_secs.max(0)),
            schedule_margin: Duration::seconds(schedule_margin_secs.max(0)),
        }
    }

    /// Earliest instant a freshly computed slot may occupy
    pub fn earliest_slot(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.schedule_margin
    }
}

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// A local wall-clock time with minute precision, serialized as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        let truncated = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self(truncated)
    }
}

impl FromStr for ClockTime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_time(s)
            .map(Self)
            .map_err(|_| DomainError::InvalidClockTime(s.to_string()))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}
