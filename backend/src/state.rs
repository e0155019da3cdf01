//! Application state management
//!
//! Shared resources handed to every request handler. Everything is behind
//! an `Arc` or is `Copy`, so cloning per request is cheap.

use crate::auth::JwtService;
use crate::cache::RunCache;
use crate::config::AppConfig;
use crate::services::environment::EnvironmentProvider;
use crate::services::push::PushDelivery;
use crate::services::RunContext;
use crate::store::DocumentStore;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::SecretString;
use std::sync::Arc;
use wellness_tracker_shared::{Clock, GeoLocation, SchedulerSettings, TimeContext};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub push: Arc<dyn PushDelivery>,
    pub environment: Arc<dyn EnvironmentProvider>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    pub time: TimeContext,
    pub settings: SchedulerSettings,
    pub metrics: Option<PrometheusHandle>,
    pub jobs_secret: Option<Arc<SecretString>>,
}

impl AppState {
    /// Fails when the configured UTC offset is out of range
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushDelivery>,
        environment: Arc<dyn EnvironmentProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let jwt = JwtService::new(&config.jwt.secret, config.jwt.access_token_expiry_secs);
        let time = TimeContext::new(config.scheduler.utc_offset_minutes)?;
        let settings = SchedulerSettings::from_secs(
            config.scheduler.trigger_tolerance_secs,
            config.scheduler.schedule_margin_secs,
        );
        let jobs_secret = config
            .jobs
            .secret
            .clone()
            .filter(|s| !s.is_empty())
            .map(|s| Arc::new(SecretString::new(s)));

        Ok(Self {
            store,
            push,
            environment,
            clock,
            config: Arc::new(config),
            jwt,
            time,
            settings,
            metrics: None,
            jobs_secret,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Context for one job run or request, with an empty cache
    pub fn run_context(&self) -> RunContext {
        let scheduler = &self.config.scheduler;
        RunContext {
            store: self.store.clone(),
            push: self.push.clone(),
            environment: self.environment.clone(),
            clock: self.clock.clone(),
            time: self.time,
            settings: self.settings,
            cache: RunCache::new(&self.config.cache, self.clock.clone()),
            default_location: GeoLocation {
                latitude: scheduler.default_latitude,
                longitude: scheduler.default_longitude,
            },
            max_concurrent_users: scheduler.max_concurrent_users,
        }
    }
}
