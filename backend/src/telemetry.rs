//! Prometheus counters

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const PUSH_DELIVERIES: &str = "wellness_push_deliveries_total";
pub const TOKENS_PRUNED: &str = "wellness_tokens_pruned_total";
pub const WATER_RESETS: &str = "wellness_water_resets_total";
pub const JOB_USER_FAILURES: &str = "wellness_job_user_failures_total";

/// Install the global Prometheus recorder
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))
}

pub fn record_delivery(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "failed" };
    counter!(PUSH_DELIVERIES, "outcome" => outcome).increment(1);
}

pub fn record_tokens_pruned(count: usize) {
    counter!(TOKENS_PRUNED).increment(count as u64);
}

pub fn record_water_reset() {
    counter!(WATER_RESETS).increment(1);
}

pub fn record_user_failure(job: &'static str) {
    counter!(JOB_USER_FAILURES, "job" => job).increment(1);
}
