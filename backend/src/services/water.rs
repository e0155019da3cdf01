//! Water reminder recomputation
//!
//! Combines the user's profile, the day's environmental forecast and the
//! stored water state into a fresh reminder plan, then persists it.

use crate::repositories::WaterRepository;
use crate::services::context::RunContext;
use anyhow::Result;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use wellness_tracker_shared::{
    DailyWeatherAverages, EnvironmentalForecast, HealthProfile, HourlyWeatherData, User,
    WaterPlan, WaterPlanInput, WaterReminderMode, WaterState,
};

pub struct WaterService;

impl WaterService {
    /// Recompute from the stored document; `None` when the user has none
    pub async fn recompute(ctx: &RunContext, user: &User) -> Result<Option<WaterPlan>> {
        let Some(water) = WaterRepository::get(ctx.store(), &user.id).await? else {
            debug!(user_id = %user.id, "No water document, skipping water schedule");
            return Ok(None);
        };
        Self::recompute_state(ctx, user, &water).await.map(Some)
    }

    /// Recompute and persist the plan for an already loaded `water` state
    pub async fn recompute_state(ctx: &RunContext, user: &User, water: &WaterState) -> Result<WaterPlan> {
        let now = ctx.now();
        let today = ctx.today();
        let mut patch = Map::new();

        if water.water_notification_option == WaterReminderMode::None {
            patch.insert("reminderTimes".into(), json!([]));
            patch.insert("nextWaterReminderTime".into(), Value::Null);
            patch.insert("nextWaterReminderMessage".into(), Value::Null);
            patch.insert("serverRecalculated".into(), json!(true));
            WaterRepository::merge(ctx.store(), &user.id, Value::Object(patch)).await?;
            ctx.cache.water.invalidate(&user.id).await;
            return Ok(WaterPlan {
                reminders: Vec::new(),
                daily_target_ml: water.daily_water_target,
                glass_count: 0,
            });
        }

        let forecast = match water.cached_forecast(today) {
            Some(cached) => cached,
            None => {
                let fetched = Self::fetch_forecast(ctx, user, today).await;
                if let Some(forecast) = &fetched {
                    patch.insert(
                        "dailyWeatherAverages".into(),
                        serde_json::to_value(DailyWeatherAverages {
                            date: today,
                            signal: forecast.daily,
                        })?,
                    );
                    patch.insert(
                        "hourlyWeatherData".into(),
                        serde_json::to_value(HourlyWeatherData {
                            date: today,
                            samples: forecast.hourly.clone(),
                        })?,
                    );
                }
                fetched.unwrap_or_else(|| EnvironmentalForecast::fallback(today))
            }
        };

        let bmr = HealthProfile::resolve(user.profile.as_ref(), today).bmr();
        let input = WaterPlanInput {
            mode: water.water_notification_option,
            intake_ml: water.water_intake,
            stored_target_ml: water.daily_water_target,
            glass_size_ml: water.glass_size,
            custom_interval: water.custom_interval(),
            bmr,
            activity: user.activity_or_default(),
            forecast: &forecast,
            window: user.window_or_default(),
        };
        let plan = ctx.water_scheduler().schedule(&input, now);

        patch.insert("dailyWaterTarget".into(), json!(plan.daily_target_ml));
        patch.insert("numGlassesRequired".into(), json!(plan.glass_count));
        patch.insert("bmr".into(), json!(bmr));
        patch.insert("reminderTimes".into(), serde_json::to_value(&plan.reminders)?);
        patch.insert(
            "nextWaterReminderTime".into(),
            plan.next().map_or(Value::Null, |r| json!(r.time)),
        );
        patch.insert(
            "nextWaterReminderMessage".into(),
            plan.next().map_or(Value::Null, |r| json!(r.message)),
        );
        patch.insert("serverRecalculated".into(), json!(true));

        WaterRepository::merge(ctx.store(), &user.id, Value::Object(patch)).await?;
        ctx.cache.water.invalidate(&user.id).await;

        debug!(
            user_id = %user.id,
            mode = ?water.water_notification_option,
            target_ml = plan.daily_target_ml,
            reminders = plan.reminders.len(),
            "Water schedule recomputed"
        );
        Ok(plan)
    }

    /// Point the next-reminder fields at the first stored slot after `now`
    ///
    /// Used after a reminder fired so the same slot is not sent again.
    pub async fn advance(ctx: &RunContext, user_id: &str, water: &WaterState) -> Result<()> {
        let now = ctx.now();
        let next = water
            .reminder_times
            .iter()
            .find(|r| r.time > now + ctx.settings.trigger_tolerance);

        WaterRepository::merge(
            ctx.store(),
            user_id,
            json!({
                "nextWaterReminderTime": next.map(|r| r.time),
                "nextWaterReminderMessage": next.map(|r| r.message.clone()),
            }),
        )
        .await?;
        ctx.cache.water.invalidate(&user_id.to_string()).await;
        Ok(())
    }

    async fn fetch_forecast(
        ctx: &RunContext,
        user: &User,
        date: chrono::NaiveDate,
    ) -> Option<EnvironmentalForecast> {
        match ctx.environment.forecast(ctx.location_for(user), date).await {
            Ok(forecast) => Some(forecast),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Environmental signal unavailable, using defaults");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::context::testing;
    use crate::services::environment::EnvironmentProvider;
    use crate::store::{paths, DocumentStore, MemoryStore};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wellness_tracker_shared::GeoLocation;

    #[derive(Default)]
    struct CountingEnvironment {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EnvironmentProvider for CountingEnvironment {
        async fn forecast(&self, _: GeoLocation, date: NaiveDate) -> Result<EnvironmentalForecast> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("provider down");
            }
            Ok(EnvironmentalForecast::fallback(date))
        }
    }

    fn user() -> User {
        User {
            id: "u1".to_string(),
            ..Default::default()
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .merge(&paths::water("u1"), json!({ "waterIntake": 0, "waterNotificationOption": "smart" }))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_forecast_is_fetched_once_per_day() {
        let store = seeded_store().await;
        let env = Arc::new(CountingEnvironment::default());
        // 06:00 UTC is 09:00 local
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        let ctx = testing::context(store.clone(), Some(env.clone()), now);

        WaterService::recompute(&ctx, &user()).await.unwrap().unwrap();
        WaterService::recompute(&ctx, &user()).await.unwrap().unwrap();

        assert_eq!(env.calls.load(Ordering::SeqCst), 1);
        let doc = store.get(&paths::water("u1")).await.unwrap().unwrap();
        assert_eq!(doc["dailyWeatherAverages"]["date"], "2024-07-01");
    }

    #[tokio::test]
    async fn test_failed_forecast_falls_back_without_caching() {
        let store = seeded_store().await;
        let env = Arc::new(CountingEnvironment {
            fail: true,
            ..Default::default()
        });
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        let ctx = testing::context(store.clone(), Some(env.clone()), now);

        let plan = WaterService::recompute(&ctx, &user()).await.unwrap().unwrap();

        assert!(!plan.reminders.is_empty());
        let doc = store.get(&paths::water("u1")).await.unwrap().unwrap();
        assert!(doc.get("dailyWeatherAverages").is_none());
        assert_eq!(doc["serverRecalculated"], true);
    }

    #[tokio::test]
    async fn test_missing_document_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        let ctx = testing::context(store.clone(), None, now);

        assert!(WaterService::recompute(&ctx, &user()).await.unwrap().is_none());
        assert!(store.get(&paths::water("u1")).await.unwrap().is_none());
    }
}
