//! Sitebook API Server
//!
//! Main entry point for the Sitebook backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitebook_api::{AppState, create_router};
use sitebook_core::clock::{Clock, SystemClock};
use sitebook_db::{DailyRecordRepository, connect};
use sitebook_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitebook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(config.jwt_config());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_offset_minutes(
        config.ledger.utc_offset_minutes,
    ));

    if config.ledger.lock_mode.runs_scheduled() {
        let repo = DailyRecordRepository::new(db.clone(), config.ledger.clone(), Arc::clone(&clock));
        let every = Duration::from_secs(config.ledger.auto_lock_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = repo.auto_lock_stale_today().await {
                    error!(error = %e, "Scheduled auto-lock failed");
                }
            }
        });
        info!(interval_secs = every.as_secs(), "Scheduled auto-lock enabled");
    }

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        ledger: config.ledger.clone(),
        clock,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
