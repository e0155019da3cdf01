//! Per-user trigger evaluation for the dispatch job
//!
//! Every category is evaluated on its own: a failure in one is logged and
//! the remaining categories still run for that user.

use crate::repositories::{
    ActivityRepository, SupplementRepository, UserRepository, WaterRepository,
};
use crate::services::context::RunContext;
use crate::services::dispatcher::Dispatcher;
use crate::services::supplements::SupplementService;
use crate::services::water::WaterService;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use wellness_tracker_shared::{
    DueNotification, NotificationOutcome, SupplementDue, SupplementStrategy, User,
    UserDispatchResult,
};

pub struct TriggerService;

impl TriggerService {
    pub async fn dispatch_user(ctx: &RunContext, user: User) -> UserDispatchResult {
        let mut user = user;
        let mut results = Vec::new();
        let now = ctx.now();

        if !user.has_tokens() {
            return UserDispatchResult {
                user_id: user.id,
                results,
            };
        }

        if let Err(e) = Self::routines(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "routines", &e);
        }
        if let Err(e) = Self::timers(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "timers", &e);
        }
        if let Err(e) = Self::calendar(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "calendar", &e);
        }
        if let Err(e) = Self::water_reminder(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "water_reminder", &e);
        }
        if let Err(e) = Self::supplement_reminders(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "supplement_reminder", &e);
        }
        if let Err(e) = Self::water_summary(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "water_summary", &e);
        }
        if let Err(e) = Self::supplement_summary(ctx, &mut user, now, &mut results).await {
            Self::log_failure(&user.id, "supplement_summary", &e);
        }

        UserDispatchResult {
            user_id: user.id,
            results,
        }
    }

    fn log_failure(user_id: &str, category: &str, error: &anyhow::Error) {
        warn!(user_id = %user_id, category, error = %error, "Trigger category failed");
    }

    async fn send_all(
        ctx: &RunContext,
        user: &mut User,
        due: Vec<DueNotification>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        for notification in due {
            if !user.has_tokens() {
                break;
            }
            results.push(Dispatcher::deliver(ctx, user, &notification).await?);
        }
        Ok(())
    }

    async fn routines(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let routines = ActivityRepository::routines(ctx.store(), &user.id).await?;
        let due = ctx.evaluator().routines(&routines, now);
        Self::send_all(ctx, user, due, results).await
    }

    async fn timers(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let timers = ActivityRepository::timers(ctx.store(), &user.id).await?;
        let due = ctx.evaluator().timers(&timers, now);
        Self::send_all(ctx, user, due, results).await
    }

    async fn calendar(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let store = ctx.store();
        let uid = user.id.clone();
        let events = ctx
            .cache
            .calendar
            .get_or_load(uid.clone(), || ActivityRepository::calendar_events(store, &uid))
            .await?;
        let due = ctx.evaluator().calendar(&events, now);
        Self::send_all(ctx, user, due, results).await
    }

    async fn water_reminder(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let store = ctx.store();
        let uid = user.id.clone();
        let water = ctx
            .cache
            .water
            .get_or_load(uid.clone(), || WaterRepository::get(store, &uid))
            .await?;
        let Some(water) = water else {
            return Ok(());
        };
        let Some(due) = ctx.evaluator().water_reminder(&water, &user.window_or_default(), now) else {
            return Ok(());
        };

        results.push(Dispatcher::deliver(ctx, user, &due).await?);
        WaterService::advance(ctx, &user.id, &water).await
    }

    async fn supplement_reminders(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let store = ctx.store();
        let uid = user.id.clone();
        let items = ctx
            .cache
            .supplements
            .get_or_load(uid.clone(), || SupplementRepository::list(store, &uid))
            .await?;
        if items.is_empty() {
            return Ok(());
        }

        let stats = SupplementRepository::stats(store, &uid, ctx.today()).await?;
        let window = user.window_or_default();
        let evaluator = ctx.evaluator();
        let mut changed = false;

        for item in &items {
            let consumed = stats.consumed(&item.name);
            match evaluator.supplement_reminder(item, consumed, &window, now) {
                SupplementDue::NotDue => {}
                SupplementDue::Suppressed { consumed } => {
                    info!(
                        user_id = %uid,
                        supplement = %item.name,
                        consumed,
                        daily_usage = item.daily_usage,
                        "Supplement reminder suppressed, daily usage reached"
                    );
                }
                SupplementDue::Due(notification) => {
                    if !user.has_tokens() {
                        break;
                    }
                    results.push(Dispatcher::deliver(ctx, user, &notification).await?);

                    // Manual slots move on to the next clock time. Stock-based
                    // reminders drop the fired slot and point at the next stored one.
                    let patch = match item.strategy() {
                        SupplementStrategy::Manual(_) => {
                            let plan = SupplementService::plan(ctx, user, item, consumed, now);
                            SupplementService::schedule_patch(&plan, now)?
                        }
                        SupplementStrategy::Automatic => {
                            let remaining =
                                item.reminders_after(now + ctx.settings.trigger_tolerance);
                            json!({
                                "reminderTimes": remaining,
                                "nextSupplementReminderTime": remaining.first().map(|r| r.time),
                            })
                        }
                    };
                    SupplementRepository::merge(store, &uid, &item.id, patch).await?;
                    changed = true;
                }
            }
        }

        if changed {
            ctx.cache.supplements.invalidate(&uid).await;
        }
        Ok(())
    }

    async fn water_summary(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let evaluator = ctx.evaluator();
        if evaluator.midnight_near(now).is_none() {
            return Ok(());
        }

        // Fresh reads: the reset may have run since the cache was filled.
        let Some(water) = WaterRepository::get(ctx.store(), &user.id).await? else {
            return Ok(());
        };
        let Some(fresh_user) = UserRepository::get(ctx.store(), &user.id).await? else {
            return Ok(());
        };
        user.last_water_summary_date = fresh_user.last_water_summary_date;

        let Some((summarized, due)) = evaluator.water_summary(user, &water, now) else {
            return Ok(());
        };
        results.push(Dispatcher::deliver(ctx, user, &due).await?);
        UserRepository::mark_water_summary(ctx.store(), &user.id, summarized).await?;
        user.last_water_summary_date = Some(summarized);
        ctx.cache.users.invalidate(&()).await;
        Ok(())
    }

    async fn supplement_summary(
        ctx: &RunContext,
        user: &mut User,
        now: DateTime<Utc>,
        results: &mut Vec<NotificationOutcome>,
    ) -> Result<()> {
        let evaluator = ctx.evaluator();
        let Some(day) = evaluator.supplement_summary_date(user, now) else {
            return Ok(());
        };
        if let Some(fresh_user) = UserRepository::get(ctx.store(), &user.id).await? {
            if fresh_user.last_supplement_summary_date == Some(day) {
                user.last_supplement_summary_date = Some(day);
                return Ok(());
            }
        }

        let items = SupplementRepository::list(ctx.store(), &user.id).await?;
        let stats = SupplementRepository::stats(ctx.store(), &user.id, day).await?;
        let Some((day, due)) = evaluator.supplement_summary(user, &items, &stats, now) else {
            return Ok(());
        };

        results.push(Dispatcher::deliver(ctx, user, &due).await?);
        UserRepository::mark_supplement_summary(ctx.store(), &user.id, day).await?;
        user.last_supplement_summary_date = Some(day);
        ctx.cache.users.invalidate(&()).await;
        Ok(())
    }
}
