//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Request extractors
//! - Error rendering

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sitebook_core::clock::Clock;
use sitebook_db::{AuditRepository, DailyRecordRepository, UserRepository};
use sitebook_shared::{JwtService, LedgerConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Daily record ledger settings.
    pub ledger: LedgerConfig,
    /// Source of "now" and "today".
    pub clock: Arc<dyn Clock>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl AppState {
    /// Daily record repository bound to this state's pool, config and clock.
    #[must_use]
    pub fn daily_records(&self) -> DailyRecordRepository {
        DailyRecordRepository::new(
            (*self.db).clone(),
            self.ledger.clone(),
            Arc::clone(&self.clock),
        )
    }

    /// Audit trail repository.
    #[must_use]
    pub fn audit(&self) -> AuditRepository {
        AuditRepository::new((*self.db).clone())
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new((*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let timeout = state.request_timeout;
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
