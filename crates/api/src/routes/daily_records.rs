//! Daily record routes.
//!
//! Opening, updating, correcting and locking records, plus per-site listing
//! and the cross-site daily summary.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiError,
    middleware::{AuthUser, ClientInfo},
};
use sitebook_core::daily_record::{DEFAULT_PRODUCTION_UNIT, ItemInput, RecordFields, RecordPatch};
use sitebook_db::repositories::OpenRecordInput;
use sitebook_shared::types::PageRequest;

/// Creates the daily record routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/daily-records", post(open_record))
        .route("/daily-records/summary", get(daily_summary))
        .route("/daily-records/{record_id}", get(get_record).put(update_record))
        .route("/daily-records/{record_id}/lock", post(lock_record))
        .route("/sites/{site_id}/daily-records", get(list_site_records))
}

// ============================================================================
// Request Types
// ============================================================================

/// One line item as submitted.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ItemRequest {
    /// Worker type.
    pub worker_type_id: Uuid,
    /// Workers present.
    #[validate(range(min = 1, message = "worker_count must be positive"))]
    pub worker_count: i32,
    /// Total paid.
    pub total_payment: Decimal,
    /// Optional roster.
    pub worker_names: Option<Vec<String>>,
    /// Optional attendance notes.
    #[validate(length(max = 2000))]
    pub attendance_notes: Option<String>,
}

impl From<ItemRequest> for ItemInput {
    fn from(item: ItemRequest) -> Self {
        Self {
            worker_type_id: item.worker_type_id,
            worker_count: item.worker_count,
            total_payment: item.total_payment,
            worker_names: item.worker_names,
            attendance_notes: item.attendance_notes,
        }
    }
}

/// Request body for opening a record.
#[derive(Debug, Deserialize, Validate)]
pub struct OpenRecordRequest {
    /// Site.
    pub site_id: Uuid,
    /// Calendar date (YYYY-MM-DD).
    pub record_date: NaiveDate,
    /// Amount produced.
    pub total_production: Option<Decimal>,
    /// Unit of production, defaults to tons.
    #[validate(length(min = 1, max = 20))]
    pub production_unit: Option<String>,
    /// Tasks completed.
    #[validate(range(min = 0))]
    pub tasks_completed: Option<i32>,
    /// Weather on the day.
    #[validate(length(max = 50))]
    pub weather_conditions: Option<String>,
    /// Free-text notes.
    pub supervisor_notes: Option<String>,
    /// Line items.
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<ItemRequest>,
}

/// Request body for updating or correcting a record.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRecordRequest {
    /// Amount produced.
    pub total_production: Option<Decimal>,
    /// Unit of production.
    #[validate(length(min = 1, max = 20))]
    pub production_unit: Option<String>,
    /// Tasks completed.
    #[validate(range(min = 0))]
    pub tasks_completed: Option<i32>,
    /// Weather on the day.
    #[validate(length(max = 50))]
    pub weather_conditions: Option<String>,
    /// Free-text notes.
    pub supervisor_notes: Option<String>,
    /// Replacement line items.
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Option<Vec<ItemRequest>>,
    /// Required when the record is locked.
    #[validate(length(max = 1000))]
    pub correction_reason: Option<String>,
    /// Version read by the client.
    pub expected_version: Option<i32>,
}

impl From<UpdateRecordRequest> for RecordPatch {
    fn from(req: UpdateRecordRequest) -> Self {
        Self {
            total_production: req.total_production,
            production_unit: req.production_unit,
            tasks_completed: req.tasks_completed,
            weather_conditions: req.weather_conditions,
            supervisor_notes: req.supervisor_notes,
            items: req
                .items
                .map(|items| items.into_iter().map(ItemInput::from).collect()),
            correction_reason: req.correction_reason,
            expected_version: req.expected_version,
        }
    }
}

/// Query parameters for listing a site's records.
#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    /// Earliest date, inclusive.
    pub start_date: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub end_date: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Query parameters for the daily summary.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Summarized date, today when absent.
    pub date: Option<NaiveDate>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/daily-records` - Open a record for a site and date.
async fn open_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ClientInfo(ctx): ClientInfo,
    Json(payload): Json<OpenRecordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let input = OpenRecordInput {
        site_id: payload.site_id,
        record_date: payload.record_date,
        fields: RecordFields {
            total_production: payload.total_production,
            production_unit: payload
                .production_unit
                .unwrap_or_else(|| DEFAULT_PRODUCTION_UNIT.to_string()),
            tasks_completed: payload.tasks_completed,
            weather_conditions: payload.weather_conditions,
            supervisor_notes: payload.supervisor_notes,
        },
        items: payload.items.into_iter().map(ItemInput::from).collect(),
    };

    let record = state.daily_records().open(&actor, input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET `/daily-records/{record_id}` - Fetch a record with its items.
async fn get_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(record_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.daily_records().find(&actor, record_id).await?;
    Ok(Json(record))
}

/// PUT `/daily-records/{record_id}` - Update, or correct a locked record.
async fn update_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ClientInfo(ctx): ClientInfo,
    Path(record_id): Path<Uuid>,
    Json(payload): Json<UpdateRecordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let record = state
        .daily_records()
        .update(&actor, record_id, payload.into(), &ctx)
        .await?;
    Ok(Json(record))
}

/// POST `/daily-records/{record_id}/lock` - Lock a record. Admin only.
async fn lock_record(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ClientInfo(ctx): ClientInfo,
    Path(record_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.daily_records().lock(&actor, record_id, &ctx).await?;
    Ok(Json(record))
}

/// GET `/sites/{site_id}/daily-records` - List a site's records.
async fn list_site_records(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(site_id): Path<Uuid>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date)
        && start > end
    {
        return Err(ApiError::validation("start_date must not be after end_date"));
    }

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let records = state
        .daily_records()
        .list_for_site(&actor, site_id, query.start_date, query.end_date, page)
        .await?;
    Ok(Json(records))
}

/// GET `/daily-records/summary` - Totals across sites for one date. Admin only.
async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.daily_records();
    let date = query.date.unwrap_or_else(|| repo.clock().today());
    let summary = repo.daily_summary(&actor, date).await?;
    Ok(Json(summary))
}
