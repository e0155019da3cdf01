//! Daily water rollover

use crate::repositories::WaterRepository;
use crate::services::context::RunContext;
use crate::telemetry;
use anyhow::Result;
use tracing::info;

pub struct ResetService;

impl ResetService {
    /// Roll the user's water day over if it has not been rolled today
    ///
    /// Returns `true` when a reset was applied.
    pub async fn reset_user(ctx: &RunContext, uid: &str) -> Result<bool> {
        let today = ctx.today();
        let Some(plan) = WaterRepository::reset(ctx.store(), uid, today).await? else {
            return Ok(false);
        };

        ctx.cache.water.invalidate(&uid.to_string()).await;
        telemetry::record_water_reset();
        info!(
            user_id = %uid,
            %today,
            carried_intake = plan.carried_intake,
            history_len = plan.history.len(),
            "Water intake reset"
        );
        Ok(true)
    }
}
