//! Job orchestration
//!
//! Loads the user list once per run and processes users concurrently with
//! a bounded fan-out. Within one user the steps run in order; a failure is
//! logged and counted and never stops the other users.

use crate::repositories::UserRepository;
use crate::services::context::RunContext;
use crate::services::reset::ResetService;
use crate::services::supplements::SupplementService;
use crate::services::triggers::TriggerService;
use crate::services::water::WaterService;
use crate::telemetry;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{error, info};
use wellness_tracker_shared::{DailyResetStats, DispatchResponse, User};

/// A daily reset that could not complete, with the counts gathered so far
#[derive(Error, Debug)]
#[error("daily reset failed: {source}")]
pub struct DailyResetFailure {
    pub stats: DailyResetStats,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Default, Clone, Copy)]
struct UserResetOutcome {
    water_reset: bool,
    water_scheduled: bool,
    supplements_scheduled: usize,
    failed: bool,
}

pub struct Orchestrator;

impl Orchestrator {
    async fn users(ctx: &RunContext) -> Result<Vec<User>> {
        let store = ctx.store();
        ctx.cache
            .users
            .get_or_load((), || UserRepository::list_all(store))
            .await
    }

    /// Reset water counters and recompute every schedule
    pub async fn run_daily_reset(ctx: &RunContext) -> Result<DailyResetStats, DailyResetFailure> {
        let mut stats = DailyResetStats::default();
        let users = Self::users(ctx).await.map_err(|source| DailyResetFailure { stats, source })?;
        stats.total_users = users.len();

        info!(users = users.len(), today = %ctx.today(), "Daily reset started");

        let outcomes: Vec<UserResetOutcome> = stream::iter(users)
            .map(|user| Self::reset_user(ctx, user))
            .buffer_unordered(ctx.max_concurrent_users.max(1))
            .collect()
            .await;

        let mut failures = 0;
        for outcome in outcomes {
            stats.water_reset_count += usize::from(outcome.water_reset);
            stats.water_notification_count += usize::from(outcome.water_scheduled);
            stats.supplement_notification_count += outcome.supplements_scheduled;
            if outcome.failed {
                failures += 1;
            }
        }

        info!(
            total_users = stats.total_users,
            water_resets = stats.water_reset_count,
            water_scheduled = stats.water_notification_count,
            supplements_scheduled = stats.supplement_notification_count,
            failures,
            "Daily reset completed"
        );
        Ok(stats)
    }

    async fn reset_user(ctx: &RunContext, user: User) -> UserResetOutcome {
        let mut outcome = UserResetOutcome::default();

        let water = async {
            let reset = ResetService::reset_user(ctx, &user.id).await?;
            let plan = WaterService::recompute(ctx, &user).await?;
            Ok::<_, anyhow::Error>((reset, plan))
        }
        .await;
        match water {
            Ok((reset, plan)) => {
                outcome.water_reset = reset;
                outcome.water_scheduled = plan.is_some_and(|p| !p.reminders.is_empty());
            }
            Err(e) => {
                outcome.failed = true;
                Self::user_failed("daily_reset", &user.id, "water", &e);
            }
        }

        match SupplementService::recompute_all(ctx, &user).await {
            Ok(scheduled) => outcome.supplements_scheduled = scheduled,
            Err(e) => {
                outcome.failed = true;
                Self::user_failed("daily_reset", &user.id, "supplements", &e);
            }
        }

        outcome
    }

    /// Evaluate every trigger for every user with device tokens
    pub async fn run_dispatch(ctx: &RunContext) -> Result<DispatchResponse> {
        let users: Vec<User> = Self::users(ctx)
            .await?
            .into_iter()
            .filter(User::has_tokens)
            .collect();

        let results: Vec<_> = stream::iter(users)
            .map(|user| TriggerService::dispatch_user(ctx, user))
            .buffer_unordered(ctx.max_concurrent_users.max(1))
            .collect()
            .await;

        let sent: usize = results.iter().map(|r| r.results.len()).sum();
        info!(users = results.len(), notifications = sent, "Dispatch completed");
        Ok(DispatchResponse { results })
    }

    fn user_failed(job: &'static str, user_id: &str, step: &str, e: &anyhow::Error) {
        telemetry::record_user_failure(job);
        error!(job, user_id = %user_id, step, error = %e, "User pipeline failed");
    }
}
