//! Dependencies of one job run or request

use crate::cache::RunCache;
use crate::services::environment::EnvironmentProvider;
use crate::services::push::PushDelivery;
use crate::store::DocumentStore;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use wellness_tracker_shared::{
    Clock, GeoLocation, SchedulerSettings, SupplementReminderScheduler, TimeContext,
    TriggerEvaluator, User, WaterReminderScheduler,
};

/// Everything a pipeline needs, with a cache that lives as long as the run
pub struct RunContext {
    pub store: Arc<dyn DocumentStore>,
    pub push: Arc<dyn PushDelivery>,
    pub environment: Arc<dyn EnvironmentProvider>,
    pub clock: Arc<dyn Clock>,
    pub time: TimeContext,
    pub settings: SchedulerSettings,
    pub cache: RunCache,
    pub default_location: GeoLocation,
    pub max_concurrent_users: usize,
}

impl RunContext {
    #[inline]
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.time.local_date(self.now())
    }

    pub fn water_scheduler(&self) -> WaterReminderScheduler {
        WaterReminderScheduler::new(self.time, self.settings)
    }

    pub fn supplement_scheduler(&self) -> SupplementReminderScheduler {
        SupplementReminderScheduler::new(self.time, self.settings)
    }

    pub fn evaluator(&self) -> TriggerEvaluator {
        TriggerEvaluator::new(self.time, self.settings)
    }

    /// The user's location, or the configured default
    pub fn location_for(&self, user: &User) -> GeoLocation {
        user.location.unwrap_or(self.default_location)
    }
}
