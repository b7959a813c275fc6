//! Audit trail routes. Admin only.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use sitebook_core::audit::{AuditAction, AuditFilter};
use sitebook_shared::types::PageRequest;

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit-logs", get(list_audit_logs))
        .route("/audit-logs/corrections", get(correction_stats))
        .route("/audit-logs/statistics", get(audit_statistics))
        .route("/audit-logs/{table_name}/{record_id}", get(record_history))
}

/// Query parameters for listing audit entries.
#[derive(Debug, Deserialize)]
pub struct ListAuditQuery {
    /// Affected table.
    pub table_name: Option<String>,
    /// Acting user.
    pub user_id: Option<Uuid>,
    /// Action name, e.g. `correction`.
    pub action: Option<String>,
    /// Affected row.
    pub record_id: Option<Uuid>,
    /// Earliest creation time, inclusive (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time, exclusive (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Time window for audit statistics.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// Earliest creation time, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time, exclusive.
    pub to: Option<DateTime<Utc>>,
}

fn check_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<(), ApiError> {
    match (from, to) {
        (Some(from), Some(to)) if from >= to => {
            Err(ApiError::validation("from must be before to"))
        }
        _ => Ok(()),
    }
}

/// GET `/audit-logs` - Filtered, paginated audit entries, newest first.
async fn list_audit_logs(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<ListAuditQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_range(query.from, query.to)?;

    let action = query
        .action
        .as_deref()
        .map(|a| {
            AuditAction::parse(a).ok_or_else(|| ApiError::validation(format!("Unknown action: {a}")))
        })
        .transpose()?;

    let filter = AuditFilter {
        table_name: query.table_name,
        user_id: query.user_id,
        action,
        record_id: query.record_id,
        from: query.from,
        to: query.to,
    };

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let entries = state.audit().list(&actor, &filter, page).await?;
    Ok(Json(entries))
}

/// GET `/audit-logs/{table_name}/{record_id}` - Full history of one row.
async fn record_history(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((table_name, record_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.audit().history(&actor, &table_name, record_id).await?;
    Ok(Json(history))
}

/// GET `/audit-logs/corrections` - Corrections per supervisor.
async fn correction_stats(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_range(query.from, query.to)?;
    let stats = state
        .audit()
        .correction_stats(&actor, query.from, query.to)
        .await?;
    Ok(Json(stats))
}

/// GET `/audit-logs/statistics` - Trail totals by action, table, user and day.
async fn audit_statistics(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_range(query.from, query.to)?;
    let stats = state.audit().statistics(&actor, query.from, query.to).await?;
    Ok(Json(stats))
}
