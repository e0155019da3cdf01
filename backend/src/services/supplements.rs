//! Supplement schedule recomputation

use crate::repositories::SupplementRepository;
use crate::services::context::RunContext;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};
use wellness_tracker_shared::{PlanReason, SupplementItem, SupplementPlan, User};

pub struct SupplementService;

impl SupplementService {
    /// Plan one supplement for `user` at `now`
    pub fn plan(
        ctx: &RunContext,
        user: &User,
        item: &SupplementItem,
        consumed_today: i64,
        now: DateTime<Utc>,
    ) -> SupplementPlan {
        let plan = ctx.supplement_scheduler().plan(
            item,
            consumed_today,
            user.notification_window.as_ref(),
            now,
        );
        if let PlanReason::Suppressed { consumed, daily_usage } = plan.reason {
            info!(
                user_id = %user.id,
                supplement = %item.name,
                consumed,
                daily_usage,
                "Supplement reminders suppressed, daily usage reached"
            );
        }
        plan
    }

    pub fn schedule_patch(plan: &SupplementPlan, now: DateTime<Utc>) -> Result<Value> {
        Ok(json!({
            "reminderTimes": serde_json::to_value(&plan.reminders)?,
            "nextSupplementReminderTime": plan.next().map(|r| r.time),
            "notificationsLastCalculated": now,
        }))
    }

    /// Recompute every supplement of `user` and write them in one batch
    ///
    /// Returns how many supplements have an upcoming reminder.
    pub async fn recompute_all(ctx: &RunContext, user: &User) -> Result<usize> {
        let now = ctx.now();
        let items = SupplementRepository::list(ctx.store(), &user.id).await?;
        if items.is_empty() {
            return Ok(0);
        }
        let stats = SupplementRepository::stats(ctx.store(), &user.id, ctx.today()).await?;

        let mut scheduled = 0;
        let mut patches = Vec::with_capacity(items.len());
        for item in &items {
            let plan = Self::plan(ctx, user, item, stats.consumed(&item.name), now);
            if plan.next().is_some() {
                scheduled += 1;
            }
            patches.push((item.id.clone(), Self::schedule_patch(&plan, now)?));
        }

        SupplementRepository::save_schedules(ctx.store(), &user.id, patches).await?;
        ctx.cache.supplements.invalidate(&user.id).await;

        debug!(user_id = %user.id, supplements = items.len(), scheduled, "Supplement schedules recomputed");
        Ok(scheduled)
    }

    /// Recompute a single supplement; `None` when it does not exist
    pub async fn recompute_one(ctx: &RunContext, user: &User, id: &str) -> Result<Option<SupplementPlan>> {
        let Some(item) = SupplementRepository::get(ctx.store(), &user.id, id).await? else {
            return Ok(None);
        };
        let now = ctx.now();
        let stats = SupplementRepository::stats(ctx.store(), &user.id, ctx.today()).await?;
        let plan = Self::plan(ctx, user, &item, stats.consumed(&item.name), now);

        SupplementRepository::merge(ctx.store(), &user.id, id, Self::schedule_patch(&plan, now)?).await?;
        ctx.cache.supplements.invalidate(&user.id).await;
        Ok(Some(plan))
    }
}
