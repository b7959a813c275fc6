//! Daily record domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Table holding daily records; used as the audit `table_name`.
pub const TABLE_NAME: &str = "daily_records";

/// Default unit for `total_production`.
pub const DEFAULT_PRODUCTION_UNIT: &str = "tons";

/// One worker type's line on a daily record, as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    /// Worker type the line is for.
    pub worker_type_id: Uuid,
    /// Workers present.
    pub worker_count: i32,
    /// Total paid to those workers.
    pub total_payment: Decimal,
    /// Optional roster.
    #[serde(default)]
    pub worker_names: Option<Vec<String>>,
    /// Optional attendance notes.
    #[serde(default)]
    pub attendance_notes: Option<String>,
}

/// A validated line item with its derived per-worker payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedItem {
    /// Worker type the line is for.
    pub worker_type_id: Uuid,
    /// Workers present.
    pub worker_count: i32,
    /// Total paid to those workers.
    pub total_payment: Decimal,
    /// `total_payment / worker_count`, rounded to cents.
    pub payment_per_worker: Decimal,
    /// Optional roster.
    pub worker_names: Option<Vec<String>>,
    /// Optional attendance notes.
    pub attendance_notes: Option<String>,
}

/// Editable scalar fields of a daily record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    /// Amount produced.
    pub total_production: Option<Decimal>,
    /// Unit of `total_production`.
    pub production_unit: String,
    /// Number of tasks completed.
    pub tasks_completed: Option<i32>,
    /// Weather on the day.
    pub weather_conditions: Option<String>,
    /// Free-text notes.
    pub supervisor_notes: Option<String>,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self {
            total_production: None,
            production_unit: DEFAULT_PRODUCTION_UNIT.to_string(),
            tasks_completed: None,
            weather_conditions: None,
            supervisor_notes: None,
        }
    }
}

/// A requested change to a daily record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// New production amount.
    pub total_production: Option<Decimal>,
    /// New production unit.
    pub production_unit: Option<String>,
    /// New task count.
    pub tasks_completed: Option<i32>,
    /// New weather description.
    pub weather_conditions: Option<String>,
    /// New notes.
    pub supervisor_notes: Option<String>,
    /// Replacement item list.
    pub items: Option<Vec<ItemInput>>,
    /// Required when the record is locked.
    pub correction_reason: Option<String>,
    /// Version the caller read; a mismatch is a conflict.
    pub expected_version: Option<i32>,
}

/// The parts of a stored record that drive lifecycle decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordState {
    /// Record id.
    pub id: Uuid,
    /// Lock flag.
    pub is_locked: bool,
    /// Corrections applied so far.
    pub correction_count: i32,
    /// Optimistic concurrency token.
    pub version: i32,
    /// Calendar date of the record.
    pub record_date: NaiveDate,
    /// Supervisor assigned to the record's site.
    pub site_supervisor_id: Option<Uuid>,
}

/// How an accepted update is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Plain edit of an unlocked record.
    Direct,
    /// Reasoned edit of a locked record.
    Correction {
        /// Correction count after this correction.
        sequence: i32,
        /// Trimmed reason.
        reason: String,
    },
}

impl UpdatePlan {
    /// Returns true for corrections.
    #[must_use]
    pub const fn is_correction(&self) -> bool {
        matches!(self, Self::Correction { .. })
    }
}

/// Outcome of a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPlan {
    /// Lock the record now.
    Lock {
        /// Lock timestamp.
        locked_at: DateTime<Utc>,
    },
    /// Nothing to do.
    AlreadyLocked,
}

/// Audit snapshot of a record: fields, items and lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSnapshot {
    /// Scalar fields.
    #[serde(flatten)]
    pub fields: RecordFields,
    /// Line items.
    pub items: Vec<DerivedItem>,
    /// Lock flag.
    pub is_locked: bool,
    /// Corrections applied so far.
    pub correction_count: i32,
    /// Reason of the last correction.
    pub last_correction_reason: Option<String>,
}

impl RecordSnapshot {
    /// Renders the snapshot as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
