//! Wellness Tracker Backend
//!
//! Reminder scheduling and notification dispatch for water intake,
//! supplements, routines, timers and calendar events.
//!
//! ## Architecture
//!
//! - Routes: job endpoints, tracking API, health and metrics
//! - Services: scheduling pipelines and push fan-out
//! - Repositories: typed access to user documents
//! - Store: PostgreSQL JSONB or in-memory documents

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wellness_tracker_backend::{
    config::{self, StoreBackend},
    db, routes,
    services::{
        DisabledPush, EnvironmentProvider, FallbackEnvironment, FcmClient, OpenMeteoClient,
        PushDelivery,
    },
    state::AppState,
    store::{DocumentStore, MemoryStore, PostgresStore},
    telemetry,
};
use wellness_tracker_shared::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        store = ?config.store.backend,
        "Starting Wellness Tracker Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let store = create_store(&config).await?;
    let push = create_push(&config)?;
    let environment = create_environment(&config)?;

    let mut state = AppState::new(config.clone(), store, push, environment, Arc::new(SystemClock))?;
    match telemetry::install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn create_store(config: &config::AppConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            info!("Connecting to database...");
            let pool = db::create_pool(&config.database).await?;

            // Skipped in production where a separate migration job runs
            if !config::AppConfig::is_production() {
                db::run_migrations(&pool).await?;
            }
            Ok(Arc::new(PostgresStore::new(pool)))
        }
    }
}

fn create_push(config: &config::AppConfig) -> Result<Arc<dyn PushDelivery>> {
    if !config.push.enabled {
        warn!("Push delivery disabled; notifications will be reported as failed");
        return Ok(Arc::new(DisabledPush));
    }
    info!(project = %config.push.project_id, "Push delivery enabled");
    Ok(Arc::new(FcmClient::new(&config.push)?))
}

fn create_environment(config: &config::AppConfig) -> Result<Arc<dyn EnvironmentProvider>> {
    if !config.weather.enabled {
        info!("Weather provider disabled; using default environmental signal");
        return Ok(Arc::new(FallbackEnvironment));
    }
    Ok(Arc::new(OpenMeteoClient::new(&config.weather)?))
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "wellness_tracker_backend=info,tower_http=info".into()
        } else {
            "wellness_tracker_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.jwt.secret.contains("development") || config.jwt.secret.len() < 32 {
        errors.push("JWT secret must be at least 32 characters and not contain 'development'");
    }

    if config.jobs.secret.as_deref().map_or(true, str::is_empty) {
        warn!("No job secret configured - job endpoints are unauthenticated");
    }

    if config.store.backend == StoreBackend::Memory {
        warn!("In-memory store in production - ensure this is intentional");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
