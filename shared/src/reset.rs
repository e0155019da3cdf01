//! Daily water rollover
//!
//! The rollover is gated solely by `lastResetDate`: a plan is produced only
//! when the stored marker differs from today's local date, so running the
//! reset any number of times in one day changes the document once.

use crate::models::{HistoryEntry, WaterState};
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Changes to apply to a water document for one rollover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPlan {
    pub today: NaiveDate,
    pub yesterday: NaiveDate,
    /// Intake being rolled into history
    pub carried_intake: i64,
    /// Target that applied to that day
    pub carried_target: i64,
    /// Full history after the rollover
    pub history: Vec<HistoryEntry>,
}

/// Decide whether `water` needs rolling over on `today`
pub fn plan_reset(water: &WaterState, today: NaiveDate) -> Option<ResetPlan> {
    if water.last_reset_date == Some(today) {
        return None;
    }

    let yesterday = today.pred_opt().unwrap_or(today);
    let entry = HistoryEntry {
        date: yesterday,
        intake: water.water_intake.max(0),
    };

    // Append-only, and an identical entry is never added twice
    let mut history = water.history.clone();
    if !history.contains(&entry) {
        history.push(entry);
    }

    Some(ResetPlan {
        today,
        yesterday,
        carried_intake: water.water_intake.max(0),
        carried_target: water.daily_water_target,
        history,
    })
}

impl ResetPlan {
    /// Apply the rollover to an in-memory state
    pub fn apply(&self, water: &mut WaterState) {
        water.history = self.history.clone();
        water.yesterday_water_intake = Some(self.carried_intake);
        water.yesterday_water_target = Some(self.carried_target);
        water.water_intake = 0;
        water.last_reset_date = Some(self.today);
        water.server_recalculated = true;
    }

    /// Top-level fields to merge into the stored document
    pub fn to_patch(&self) -> Value {
        json!({
            "history": self.history,
            "yesterdayWaterIntake": self.carried_intake,
            "yesterdayWaterTarget": self.carried_target,
            "waterIntake": 0,
            "lastResetDate": self.today,
            "serverRecalculated": true,
        })
    }
}
