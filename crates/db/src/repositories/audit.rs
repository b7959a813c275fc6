//! Audit trail repository.
//!
//! The trail is append-only: this repository inserts and reads, nothing else.
//! Writes go through [`AuditRepository::record`], which takes the caller's
//! connection so the audit row commits or rolls back with the change it
//! describes.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use sitebook_core::access::{AccessError, AccessPolicy, Action, Actor, Resource};
use sitebook_core::audit::{AuditAction as CoreAuditAction, AuditEntry, AuditFilter};
use sitebook_core::daily_record::{LedgerError, TABLE_NAME};
use sitebook_shared::types::{PageRequest, PageResponse};

use crate::entities::sea_orm_active_enums::{AuditAction, UserRole};
use crate::entities::{audit_logs, daily_records, users};

/// Most active users reported by [`AuditRepository::statistics`].
pub const TOP_USERS: usize = 10;

/// Most recent days reported by [`AuditRepository::statistics`].
pub const ACTIVITY_DAYS: usize = 30;

/// Errors from audit trail operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The actor may not read the audit trail.
    #[error(transparent)]
    Denied(#[from] AccessError),

    /// The store could not be reached or rejected the write.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AuditError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Denied(_) => 403,
            Self::StorageUnavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Denied(err) => err.error_code(),
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl From<AuditError> for LedgerError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Denied(access) => access.into(),
            AuditError::StorageUnavailable(msg) => Self::StorageUnavailable(msg),
        }
    }
}

fn storage(e: &sea_orm::DbErr) -> AuditError {
    tracing::error!(error = %e, "audit storage failure");
    AuditError::StorageUnavailable(e.to_string())
}

/// Corrections attributed to one supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionStat {
    /// Supervisor the corrected records belong to.
    pub supervisor_id: Uuid,
    /// Supervisor's full name, when the user still exists.
    pub supervisor_name: Option<String>,
    /// Number of correction entries.
    pub corrections: u64,
    /// Number of distinct records corrected.
    pub records_corrected: u64,
}

/// Totals over the entries in a statistics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditTotals {
    /// Entries in the window.
    pub total_actions: u64,
    /// Distinct acting users, system actions excluded.
    pub active_users: u64,
    /// Distinct tables touched.
    pub tables_affected: u64,
    /// Distinct rows touched.
    pub records_affected: u64,
}

/// Entries of one action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    /// Action kind.
    pub action: CoreAuditAction,
    /// Entries.
    pub count: u64,
}

/// Entries touching one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    /// Table name.
    pub table_name: String,
    /// Entries.
    pub count: u64,
}

/// Entries written by one user.
///
/// `user_id` is `None` for system actions and for users deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    /// Acting user.
    pub user_id: Option<Uuid>,
    /// Login name.
    pub username: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Role.
    pub role: Option<UserRole>,
    /// Entries.
    pub action_count: u64,
}

/// Entries written on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    /// Day.
    pub date: NaiveDate,
    /// Entries.
    pub count: u64,
}

/// Aggregate view of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStatistics {
    /// Overall totals.
    pub overall: AuditTotals,
    /// Entries per action kind, most frequent first.
    pub by_action: Vec<ActionCount>,
    /// Entries per table, most frequent first.
    pub by_table: Vec<TableCount>,
    /// The most active users, most active first.
    pub by_user: Vec<UserActivity>,
    /// Entries per day for the latest days with activity, newest first.
    pub daily_activity: Vec<ActivityDay>,
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Descending by count, then ascending by key.
fn ranked<K: Ord>(counts: HashMap<K, u64>) -> Vec<(K, u64)> {
    let mut ranked: Vec<(K, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

fn within(
    query: Select<audit_logs::Entity>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Select<audit_logs::Entity> {
    let query = match from {
        Some(from) => query.filter(audit_logs::Column::CreatedAt.gte(from.fixed_offset())),
        None => query,
    };
    match to {
        Some(to) => query.filter(audit_logs::Column::CreatedAt.lt(to.fixed_offset())),
        None => query,
    }
}

/// Audit trail repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists one entry on `conn`, which may be an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::StorageUnavailable` if the insert fails.
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        entry: AuditEntry,
    ) -> Result<audit_logs::Model, AuditError> {
        let action = entry.action;
        let model = audit_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(entry.actor_id),
            action: Set(entry.action.into()),
            table_name: Set(entry.table_name),
            record_id: Set(entry.record_id),
            old_values: Set(entry.old_values),
            new_values: Set(entry.new_values),
            description: Set(entry.description),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            correction_reason: Set(entry.correction_reason),
            correction_count: Set(entry.correction_count),
            created_at: Set(entry.occurred_at.unwrap_or_else(Utc::now).into()),
        };

        let saved = model.insert(conn).await.map_err(|e| storage(&e))?;
        tracing::debug!(audit_id = %saved.id, action = %action, "audit entry recorded");
        Ok(saved)
    }

    /// Persists one entry on the repository's own connection.
    ///
    /// Used for actions with no accompanying data change, such as logins.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::StorageUnavailable` if the insert fails.
    pub async fn log(&self, entry: AuditEntry) -> Result<audit_logs::Model, AuditError> {
        Self::record(&self.db, entry).await
    }

    /// Lists entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Denied` for non-admins.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> Result<PageResponse<audit_logs::Model>, AuditError> {
        Self::authorize(actor)?;
        let page = page.normalized();

        let mut query = audit_logs::Entity::find();
        if let Some(table_name) = &filter.table_name {
            query = query.filter(audit_logs::Column::TableName.eq(table_name.as_str()));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(audit_logs::Column::UserId.eq(user_id));
        }
        if let Some(action) = filter.action {
            query = query.filter(audit_logs::Column::Action.eq(AuditAction::from(action)));
        }
        if let Some(record_id) = filter.record_id {
            query = query.filter(audit_logs::Column::RecordId.eq(record_id));
        }
        let query = within(query, filter.from, filter.to);

        let total = query.clone().count(&self.db).await.map_err(|e| storage(&e))?;

        let data = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Returns every entry for one row, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Denied` for non-admins.
    pub async fn history(
        &self,
        actor: &Actor,
        table_name: &str,
        record_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, AuditError> {
        Self::authorize(actor)?;

        audit_logs::Entity::find()
            .filter(audit_logs::Column::TableName.eq(table_name))
            .filter(audit_logs::Column::RecordId.eq(record_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))
    }

    /// Counts daily record corrections per supervisor, most corrected first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Denied` for non-admins.
    pub async fn correction_stats(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<CorrectionStat>, AuditError> {
        Self::authorize(actor)?;

        let query = audit_logs::Entity::find()
            .filter(audit_logs::Column::Action.eq(AuditAction::Correction))
            .filter(audit_logs::Column::TableName.eq(TABLE_NAME));
        let entries = within(query, from, to)
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?;

        let record_ids: Vec<Uuid> = entries.iter().filter_map(|e| e.record_id).collect();
        if record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let supervisors: HashMap<Uuid, Uuid> = daily_records::Entity::find()
            .filter(daily_records::Column::Id.is_in(record_ids))
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?
            .into_iter()
            .map(|r| (r.id, r.supervisor_id))
            .collect();

        let mut counts: HashMap<Uuid, (u64, HashSet<Uuid>)> = HashMap::new();
        for record_id in entries.iter().filter_map(|e| e.record_id) {
            if let Some(supervisor_id) = supervisors.get(&record_id) {
                let slot = counts.entry(*supervisor_id).or_default();
                slot.0 += 1;
                slot.1.insert(record_id);
            }
        }

        let names: HashMap<Uuid, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(counts.keys().copied().collect::<Vec<_>>()))
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?
            .into_iter()
            .map(|u| (u.id, u.full_name))
            .collect();

        let mut stats: Vec<CorrectionStat> = counts
            .into_iter()
            .map(|(supervisor_id, (corrections, records))| CorrectionStat {
                supervisor_id,
                supervisor_name: names.get(&supervisor_id).cloned(),
                corrections,
                records_corrected: to_u64(records.len()),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.corrections
                .cmp(&a.corrections)
                .then_with(|| a.supervisor_id.cmp(&b.supervisor_id))
        });

        Ok(stats)
    }

    /// Summarizes the trail, optionally within `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Denied` for non-admins.
    pub async fn statistics(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStatistics, AuditError> {
        Self::authorize(actor)?;

        let rows: Vec<(Option<Uuid>, AuditAction, String, Option<Uuid>, DateTimeWithTimeZone)> =
            within(audit_logs::Entity::find(), from, to)
                .select_only()
                .column(audit_logs::Column::UserId)
                .column(audit_logs::Column::Action)
                .column(audit_logs::Column::TableName)
                .column(audit_logs::Column::RecordId)
                .column(audit_logs::Column::CreatedAt)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| storage(&e))?;

        let mut by_action: HashMap<CoreAuditAction, u64> = HashMap::new();
        let mut by_table: HashMap<String, u64> = HashMap::new();
        let mut by_user: HashMap<Option<Uuid>, u64> = HashMap::new();
        let mut by_day: HashMap<NaiveDate, u64> = HashMap::new();
        let mut records: HashSet<Uuid> = HashSet::new();

        for (user_id, action, table_name, record_id, created_at) in &rows {
            *by_action.entry(CoreAuditAction::from(*action)).or_default() += 1;
            *by_table.entry(table_name.clone()).or_default() += 1;
            *by_user.entry(*user_id).or_default() += 1;
            *by_day
                .entry(created_at.with_timezone(&Utc).date_naive())
                .or_default() += 1;
            if let Some(record_id) = record_id {
                records.insert(*record_id);
            }
        }

        let overall = AuditTotals {
            total_actions: to_u64(rows.len()),
            active_users: to_u64(by_user.keys().filter(|id| id.is_some()).count()),
            tables_affected: to_u64(by_table.len()),
            records_affected: to_u64(records.len()),
        };

        let top_users: Vec<(Option<Uuid>, u64)> =
            ranked(by_user).into_iter().take(TOP_USERS).collect();
        let known: Vec<Uuid> = top_users.iter().filter_map(|(id, _)| *id).collect();
        let profiles: HashMap<Uuid, users::Model> = if known.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(known))
                .all(&self.db)
                .await
                .map_err(|e| storage(&e))?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        let mut action_counts: Vec<ActionCount> = by_action
            .into_iter()
            .map(|(action, count)| ActionCount { action, count })
            .collect();
        action_counts.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.action.as_str().cmp(b.action.as_str()))
        });

        let mut days: Vec<(NaiveDate, u64)> = by_day.into_iter().collect();
        days.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(AuditStatistics {
            overall,
            by_action: action_counts,
            by_table: ranked(by_table)
                .into_iter()
                .map(|(table_name, count)| TableCount { table_name, count })
                .collect(),
            by_user: top_users
                .into_iter()
                .map(|(user_id, action_count)| {
                    let profile = user_id.and_then(|id| profiles.get(&id));
                    UserActivity {
                        user_id,
                        username: profile.map(|u| u.username.clone()),
                        full_name: profile.map(|u| u.full_name.clone()),
                        role: profile.map(|u| u.role),
                        action_count,
                    }
                })
                .collect(),
            daily_activity: days
                .into_iter()
                .take(ACTIVITY_DAYS)
                .map(|(date, count)| ActivityDay { date, count })
                .collect(),
        })
    }

    fn authorize(actor: &Actor) -> Result<(), AuditError> {
        AccessPolicy::evaluate(actor, Action::ReadAudit, &Resource::AuditLog)
            .require(Action::ReadAudit)?;
        Ok(())
    }
}
