//! Maintenance routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::post,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use sitebook_core::access::{AccessPolicy, Action, Resource};

/// Creates the maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/maintenance/auto-lock", post(auto_lock))
}

/// Query parameters for a manual auto-lock run.
#[derive(Debug, Deserialize)]
pub struct AutoLockQuery {
    /// Records dated before this are locked; today when absent.
    pub as_of: Option<NaiveDate>,
}

/// Result of an auto-lock run.
#[derive(Debug, Serialize)]
pub struct AutoLockResponse {
    /// Cut-off date used.
    pub as_of: NaiveDate,
    /// Records locked by this run.
    pub locked: Vec<Uuid>,
}

/// POST `/maintenance/auto-lock` - Lock stale records now. Admin only.
async fn auto_lock(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<AutoLockQuery>,
) -> Result<impl IntoResponse, ApiError> {
    AccessPolicy::evaluate(&actor, Action::RunMaintenance, &Resource::System)
        .require(Action::RunMaintenance)?;

    let repo = state.daily_records();
    let today = repo.clock().today();
    let as_of = query.as_of.map_or(today, |d| d.min(today));

    let locked = repo.auto_lock_stale(as_of).await?;
    info!(user_id = %actor.user_id, as_of = %as_of, count = locked.len(), "Manual auto-lock run");

    Ok(Json(AutoLockResponse { as_of, locked }))
}
