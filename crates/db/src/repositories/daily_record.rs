//! Daily record repository.
//!
//! Every mutation runs in one database transaction that also carries its
//! audit entry. Writes are conditional on the version read at the start of
//! the transaction; losing that race is a `Conflict` and rolls everything
//! back.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use sitebook_core::access::{AccessPolicy, Action, Actor, Resource};
use sitebook_core::audit::{AuditAction, AuditEntry, RequestContext, changed_fields};
use sitebook_core::clock::Clock;
use sitebook_core::daily_record::{
    DailyRecordService, DerivedItem, ItemInput, LedgerError, LockPlan, PayrollTotals,
    RecordFields, RecordPatch, RecordSnapshot, RecordState, TABLE_NAME, UpdatePlan, derive_item,
    validate_items,
};
use sitebook_shared::config::LedgerConfig;
use sitebook_shared::types::{PageRequest, PageResponse};

use crate::entities::{daily_record_items, daily_records, sites, worker_types};
use crate::repositories::audit::AuditRepository;
use crate::repositories::site::SiteRepository;

/// Days covered by [`DailySummary::recent_activity`], the summarized date included.
pub const RECENT_ACTIVITY_DAYS: u64 = 7;

/// Input for opening a daily record.
#[derive(Debug, Clone)]
pub struct OpenRecordInput {
    /// Site the record is for.
    pub site_id: Uuid,
    /// Calendar date of the record.
    pub record_date: NaiveDate,
    /// Scalar fields.
    pub fields: RecordFields,
    /// Line items.
    pub items: Vec<ItemInput>,
}

/// A daily record with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecordWithItems {
    /// The record row.
    #[serde(flatten)]
    pub record: daily_records::Model,
    /// Its items.
    pub items: Vec<daily_record_items::Model>,
    /// Totals over the items.
    pub totals: PayrollTotals,
}

impl DailyRecordWithItems {
    fn new(record: daily_records::Model, items: Vec<daily_record_items::Model>) -> Self {
        let totals = PayrollTotals::from_items(&items.iter().map(derived).collect::<Vec<_>>());
        Self {
            record,
            items,
            totals,
        }
    }
}

/// A site with no record on the summarized date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSite {
    /// Site id.
    pub site_id: Uuid,
    /// Site name.
    pub name: String,
    /// Site code.
    pub code: String,
}

/// Totals for one date of [`DailySummary::recent_activity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    /// Record date.
    pub date: NaiveDate,
    /// Records on that date.
    pub record_count: u64,
    /// Workers across those records.
    pub total_workers: i64,
    /// Payments across those records.
    pub total_payment: Decimal,
}

/// Totals across all sites for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    /// Summarized date.
    pub date: NaiveDate,
    /// Records on that date.
    pub record_count: u64,
    /// Distinct sites with a record.
    pub sites_with_records: u64,
    /// Records already locked.
    pub locked_count: u64,
    /// Workers across all records.
    pub total_workers: i64,
    /// Payments across all records.
    pub total_payment: Decimal,
    /// Active sites without a record.
    pub missing_sites: Vec<MissingSite>,
    /// Dates with records in the week up to `date`, newest first.
    pub recent_activity: Vec<DailyActivity>,
}

fn storage(e: &DbErr) -> LedgerError {
    error!(error = %e, "daily record storage failure");
    LedgerError::StorageUnavailable(e.to_string())
}

fn derived(item: &daily_record_items::Model) -> DerivedItem {
    DerivedItem {
        worker_type_id: item.worker_type_id,
        worker_count: item.worker_count,
        total_payment: item.total_payment,
        payment_per_worker: item.payment_per_worker,
        worker_names: item
            .worker_names
            .clone()
            .and_then(|names| serde_json::from_value(names).ok()),
        attendance_notes: item.attendance_notes.clone(),
    }
}

fn as_input(item: &daily_record_items::Model) -> ItemInput {
    ItemInput {
        worker_type_id: item.worker_type_id,
        worker_count: item.worker_count,
        total_payment: item.total_payment,
        worker_names: item
            .worker_names
            .clone()
            .and_then(|names| serde_json::from_value(names).ok()),
        attendance_notes: item.attendance_notes.clone(),
    }
}

fn fields_of(record: &daily_records::Model) -> RecordFields {
    RecordFields {
        total_production: record.total_production,
        production_unit: record.production_unit.clone(),
        tasks_completed: record.tasks_completed,
        weather_conditions: record.weather_conditions.clone(),
        supervisor_notes: record.supervisor_notes.clone(),
    }
}

fn snapshot(
    record: &daily_records::Model,
    items: &[daily_record_items::Model],
) -> serde_json::Value {
    RecordSnapshot {
        fields: fields_of(record),
        items: items.iter().map(derived).collect(),
        is_locked: record.is_locked,
        correction_count: record.correction_count,
        last_correction_reason: record.last_correction_reason.clone(),
    }
    .to_json()
}

fn state_of(record: &daily_records::Model, site: &sites::Model) -> RecordState {
    RecordState {
        id: record.id,
        is_locked: record.is_locked,
        correction_count: record.correction_count,
        version: record.version,
        record_date: record.record_date,
        site_supervisor_id: site.supervisor_id,
    }
}

/// Daily record repository.
#[derive(Debug, Clone)]
pub struct DailyRecordRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl DailyRecordRepository {
    /// Creates a new daily record repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { db, config, clock }
    }

    /// The clock this repository decides staleness with.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Opens a new record for a site and date.
    ///
    /// # Errors
    ///
    /// - `FutureDate` if the date is after today
    /// - `SiteNotFound` if the site does not exist
    /// - `AuthorizationError` if a supervisor does not supervise the site
    /// - `InvalidItem` for malformed items
    /// - `DuplicateRecord` if the site already has a record on that date
    pub async fn open(
        &self,
        actor: &Actor,
        input: OpenRecordInput,
        ctx: &RequestContext,
    ) -> Result<DailyRecordWithItems, LedgerError> {
        DailyRecordService::validate_date(input.record_date, self.clock.today())?;

        let txn = self.db.begin().await.map_err(|e| storage(&e))?;

        let site = sites::Entity::find_by_id(input.site_id)
            .one(&txn)
            .await
            .map_err(|e| storage(&e))?
            .ok_or(LedgerError::SiteNotFound(input.site_id))?;

        let supervisor_id = DailyRecordService::authorize_open(actor, site.supervisor_id)?;
        let worker_type_ids = site_worker_types(&txn, site.id, true).await?;
        let items = validate_items(&input.items, &worker_type_ids)?;

        let existing = daily_records::Entity::find()
            .filter(daily_records::Column::SiteId.eq(site.id))
            .filter(daily_records::Column::RecordDate.eq(input.record_date))
            .count(&txn)
            .await
            .map_err(|e| storage(&e))?;
        if existing > 0 {
            return Err(LedgerError::DuplicateRecord {
                site_id: site.id,
                record_date: input.record_date,
            });
        }

        let opened_at = self.clock.now();
        let now = opened_at.into();
        let record = daily_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(site.id),
            supervisor_id: Set(supervisor_id),
            record_date: Set(input.record_date),
            total_production: Set(input.fields.total_production),
            production_unit: Set(input.fields.production_unit),
            tasks_completed: Set(input.fields.tasks_completed),
            weather_conditions: Set(input.fields.weather_conditions),
            supervisor_notes: Set(input.fields.supervisor_notes),
            is_locked: Set(false),
            correction_count: Set(0),
            last_correction_reason: Set(None),
            version: Set(1),
            locked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                LedgerError::DuplicateRecord {
                    site_id: site.id,
                    record_date: input.record_date,
                }
            } else {
                storage(&e)
            }
        })?;

        let items = insert_items(&txn, record.id, &items, opened_at).await?;

        AuditRepository::record(
            &txn,
            AuditEntry::new(AuditAction::Create, TABLE_NAME)
                .actor(Some(actor.user_id))
                .record(record.id)
                .values(None, Some(snapshot(&record, &items)))
                .description(format!(
                    "Opened daily record for site {} on {}",
                    site.code, record.record_date
                ))
                .context(ctx)
                .at(opened_at),
        )
        .await?;

        txn.commit().await.map_err(|e| storage(&e))?;

        info!(record_id = %record.id, site_id = %site.id, date = %record.record_date, "daily record opened");
        Ok(DailyRecordWithItems::new(record, items))
    }

    /// Updates a record, or corrects it if it is locked.
    ///
    /// With lazy locking enabled, a stale unlocked record is first locked as
    /// a system action, so the update is then treated as a correction.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `Conflict` if `expected_version` is stale or a concurrent write won
    /// - `LockedWithoutReason` for a locked record without a reason
    /// - `InsufficientPrivilege` for a correction by a non-admin
    /// - `AuthorizationError` for a supervisor of another site
    /// - `CorrectionLimitReached` when the configured limit is used up
    /// - `InvalidItem` for malformed replacement items
    pub async fn update(
        &self,
        actor: &Actor,
        record_id: Uuid,
        patch: RecordPatch,
        ctx: &RequestContext,
    ) -> Result<DailyRecordWithItems, LedgerError> {
        if self.config.lock_mode.locks_on_access() {
            self.lock_if_stale(record_id).await?;
        }

        let txn = self.db.begin().await.map_err(|e| storage(&e))?;

        let (record, site) = load_with_site(&txn, record_id).await?;
        let state = state_of(&record, &site);

        let plan = DailyRecordService::plan_update(actor, &state, &patch, self.config.max_corrections)
            .inspect_err(|e| {
                if state.is_locked {
                    warn!(record_id = %record_id, user_id = %actor.user_id, error = %e, "correction rejected");
                } else if matches!(e, LedgerError::Conflict(_)) {
                    warn!(record_id = %record_id, expected = ?patch.expected_version, actual = state.version, "stale version");
                }
            })?;

        let old_items = load_items(&txn, record.id).await?;
        let old_values = snapshot(&record, &old_items);

        let new_items = match &patch.items {
            Some(items) => {
                // Corrections may still name worker types retired since the record was opened.
                let worker_type_ids = site_worker_types(&txn, site.id, false).await?;
                Some(validate_items(items, &worker_type_ids)?)
            }
            None => None,
        };

        let fields = DailyRecordService::apply(&fields_of(&record), &patch);
        let now: DateTime<Utc> = self.clock.now();

        let mut update = daily_records::Entity::update_many()
            .col_expr(
                daily_records::Column::TotalProduction,
                Expr::value(fields.total_production),
            )
            .col_expr(
                daily_records::Column::ProductionUnit,
                Expr::value(fields.production_unit),
            )
            .col_expr(
                daily_records::Column::TasksCompleted,
                Expr::value(fields.tasks_completed),
            )
            .col_expr(
                daily_records::Column::WeatherConditions,
                Expr::value(fields.weather_conditions),
            )
            .col_expr(
                daily_records::Column::SupervisorNotes,
                Expr::value(fields.supervisor_notes),
            )
            .col_expr(daily_records::Column::Version, Expr::value(state.version + 1))
            .col_expr(daily_records::Column::UpdatedAt, Expr::value(now.fixed_offset()));

        if let UpdatePlan::Correction { sequence, reason } = &plan {
            update = update
                .col_expr(daily_records::Column::CorrectionCount, Expr::value(*sequence))
                .col_expr(
                    daily_records::Column::LastCorrectionReason,
                    Expr::value(Some(reason.clone())),
                );
        }

        let result = update
            .filter(daily_records::Column::Id.eq(record.id))
            .filter(daily_records::Column::Version.eq(state.version))
            .exec(&txn)
            .await
            .map_err(|e| storage(&e))?;
        if result.rows_affected == 0 {
            warn!(record_id = %record.id, "concurrent modification detected");
            return Err(LedgerError::Conflict(record.id));
        }

        let items = match new_items {
            Some(items) => {
                daily_record_items::Entity::delete_many()
                    .filter(daily_record_items::Column::DailyRecordId.eq(record.id))
                    .exec(&txn)
                    .await
                    .map_err(|e| storage(&e))?;
                insert_items(&txn, record.id, &items, now).await?
            }
            None => {
                rederive_items(&txn, &old_items).await?;
                load_items(&txn, record.id).await?
            }
        };

        let updated = daily_records::Entity::find_by_id(record.id)
            .one(&txn)
            .await
            .map_err(|e| storage(&e))?
            .ok_or(LedgerError::NotFound(record.id))?;

        let new_values = snapshot(&updated, &items);
        let changed = changed_fields(&old_values, &new_values).join(", ");
        let action = if plan.is_correction() {
            AuditAction::Correction
        } else {
            AuditAction::Update
        };
        let entry = AuditEntry::new(action, TABLE_NAME)
            .actor(Some(actor.user_id))
            .record(record.id)
            .values(Some(old_values), Some(new_values))
            .context(ctx)
            .at(now);
        let entry = match &plan {
            UpdatePlan::Direct => entry.description(format!("Updated daily record: {changed}")),
            UpdatePlan::Correction { sequence, reason } => entry
                .description(format!(
                    "Correction #{sequence} of locked daily record: {changed}"
                ))
                .correction(reason.clone(), *sequence),
        };
        AuditRepository::record(&txn, entry).await?;

        txn.commit().await.map_err(|e| storage(&e))?;

        match &plan {
            UpdatePlan::Direct => info!(record_id = %record.id, version = updated.version, "daily record updated"),
            UpdatePlan::Correction { sequence, .. } => {
                info!(record_id = %record.id, correction = sequence, "daily record corrected");
            }
        }
        Ok(DailyRecordWithItems::new(updated, items))
    }

    /// Locks a record. Locking a locked record changes nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `InsufficientPrivilege` for non-admins
    pub async fn lock(
        &self,
        actor: &Actor,
        record_id: Uuid,
        ctx: &RequestContext,
    ) -> Result<DailyRecordWithItems, LedgerError> {
        let txn = self.db.begin().await.map_err(|e| storage(&e))?;

        let (record, site) = load_with_site(&txn, record_id).await?;
        let plan = DailyRecordService::plan_lock(actor, &state_of(&record, &site), self.clock.now())?;

        let locked = match plan {
            LockPlan::AlreadyLocked => record,
            LockPlan::Lock { locked_at } => {
                lock_in_txn(&txn, &record, Some(actor.user_id), locked_at, ctx).await?
            }
        };
        let items = load_items(&txn, locked.id).await?;

        txn.commit().await.map_err(|e| storage(&e))?;

        if matches!(plan, LockPlan::Lock { .. }) {
            info!(record_id = %locked.id, user_id = %actor.user_id, "daily record locked");
        }
        Ok(DailyRecordWithItems::new(locked, items))
    }

    /// Locks every unlocked record dated strictly before `as_of`.
    ///
    /// Each record is locked in its own transaction with a system audit
    /// entry. Records modified concurrently are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store fails.
    pub async fn auto_lock_stale(&self, as_of: NaiveDate) -> Result<Vec<Uuid>, LedgerError> {
        let candidates = daily_records::Entity::find()
            .filter(daily_records::Column::IsLocked.eq(false))
            .filter(daily_records::Column::RecordDate.lt(as_of))
            .order_by_asc(daily_records::Column::RecordDate)
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?;

        let mut locked = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.lock_stale_record(candidate.id, as_of).await {
                Ok(true) => locked.push(candidate.id),
                Ok(false) => {}
                Err(LedgerError::Conflict(id)) => {
                    warn!(record_id = %id, "skipping auto-lock of concurrently modified record");
                }
                Err(e) => return Err(e),
            }
        }

        if !locked.is_empty() {
            info!(count = locked.len(), as_of = %as_of, "auto-locked stale daily records");
        }
        Ok(locked)
    }

    /// Runs [`Self::auto_lock_stale`] for the clock's current date.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store fails.
    pub async fn auto_lock_stale_today(&self) -> Result<Vec<Uuid>, LedgerError> {
        self.auto_lock_stale(self.clock.today()).await
    }

    /// Loads one record with its items.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `AuthorizationError` for a supervisor of another site
    pub async fn find(
        &self,
        actor: &Actor,
        record_id: Uuid,
    ) -> Result<DailyRecordWithItems, LedgerError> {
        let (record, site) = load_with_site(&self.db, record_id).await?;
        DailyRecordService::authorize_read(actor, site.supervisor_id)?;
        let items = load_items(&self.db, record.id).await?;
        Ok(DailyRecordWithItems::new(record, items))
    }

    /// Lists a site's records, newest date first.
    ///
    /// # Errors
    ///
    /// - `SiteNotFound` if the site does not exist
    /// - `AuthorizationError` for a supervisor of another site
    pub async fn list_for_site(
        &self,
        actor: &Actor,
        site_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<PageResponse<daily_records::Model>, LedgerError> {
        let site = sites::Entity::find_by_id(site_id)
            .one(&self.db)
            .await
            .map_err(|e| storage(&e))?
            .ok_or(LedgerError::SiteNotFound(site_id))?;
        DailyRecordService::authorize_read(actor, site.supervisor_id)?;

        let page = page.normalized();
        let mut query =
            daily_records::Entity::find().filter(daily_records::Column::SiteId.eq(site_id));
        if let Some(start) = start_date {
            query = query.filter(daily_records::Column::RecordDate.gte(start));
        }
        if let Some(end) = end_date {
            query = query.filter(daily_records::Column::RecordDate.lte(end));
        }

        let total = query.clone().count(&self.db).await.map_err(|e| storage(&e))?;
        let data = query
            .order_by_desc(daily_records::Column::RecordDate)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Totals across all sites for one date. Admin only.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientPrivilege` for non-admins.
    pub async fn daily_summary(
        &self,
        actor: &Actor,
        date: NaiveDate,
    ) -> Result<DailySummary, LedgerError> {
        AccessPolicy::evaluate(actor, Action::Read, &Resource::System).require(Action::Read)?;

        let window_start = date
            .checked_sub_days(Days::new(RECENT_ACTIVITY_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);
        let recent = daily_records::Entity::find()
            .filter(daily_records::Column::RecordDate.between(window_start, date))
            .all(&self.db)
            .await
            .map_err(|e| storage(&e))?;

        let record_dates: HashMap<Uuid, NaiveDate> =
            recent.iter().map(|r| (r.id, r.record_date)).collect();
        let items = if record_dates.is_empty() {
            Vec::new()
        } else {
            daily_record_items::Entity::find()
                .filter(
                    daily_record_items::Column::DailyRecordId
                        .is_in(record_dates.keys().copied().collect::<Vec<_>>()),
                )
                .all(&self.db)
                .await
                .map_err(|e| storage(&e))?
        };

        let mut per_date: BTreeMap<NaiveDate, (u64, Vec<DerivedItem>)> = BTreeMap::new();
        for record in &recent {
            per_date.entry(record.record_date).or_default().0 += 1;
        }
        for item in &items {
            if let Some(record_date) = record_dates.get(&item.daily_record_id) {
                per_date.entry(*record_date).or_default().1.push(derived(item));
            }
        }
        let totals = per_date
            .get(&date)
            .map(|(_, items)| PayrollTotals::from_items(items))
            .unwrap_or_default();
        let recent_activity = per_date
            .iter()
            .rev()
            .map(|(record_date, (record_count, items))| {
                let totals = PayrollTotals::from_items(items);
                DailyActivity {
                    date: *record_date,
                    record_count: *record_count,
                    total_workers: totals.total_workers,
                    total_payment: totals.total_payment,
                }
            })
            .collect();

        let records: Vec<&daily_records::Model> =
            recent.iter().filter(|r| r.record_date == date).collect();
        let reporting: HashSet<Uuid> = records.iter().map(|r| r.site_id).collect();
        let missing_sites = SiteRepository::new(self.db.clone())
            .list_active()
            .await
            .map_err(|e| storage(&e))?
            .into_iter()
            .filter(|s| !reporting.contains(&s.id))
            .map(|s| MissingSite {
                site_id: s.id,
                name: s.name,
                code: s.code,
            })
            .collect();

        Ok(DailySummary {
            date,
            record_count: records.len() as u64,
            sites_with_records: reporting.len() as u64,
            locked_count: records.iter().filter(|r| r.is_locked).count() as u64,
            total_workers: totals.total_workers,
            total_payment: totals.total_payment,
            missing_sites,
            recent_activity,
        })
    }

    async fn lock_if_stale(&self, record_id: Uuid) -> Result<(), LedgerError> {
        let today = self.clock.today();
        let Some(record) = daily_records::Entity::find_by_id(record_id)
            .one(&self.db)
            .await
            .map_err(|e| storage(&e))?
        else {
            return Ok(());
        };

        if record.is_locked || !DailyRecordService::is_stale(record.record_date, today) {
            return Ok(());
        }

        match self.lock_stale_record(record_id, today).await {
            Ok(true) => {
                info!(record_id = %record_id, "stale daily record locked on access");
                Ok(())
            }
            Ok(false) | Err(LedgerError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Locks one record as a system action if it is still unlocked and stale.
    async fn lock_stale_record(&self, record_id: Uuid, as_of: NaiveDate) -> Result<bool, LedgerError> {
        let txn = self.db.begin().await.map_err(|e| storage(&e))?;

        let Some(record) = daily_records::Entity::find_by_id(record_id)
            .one(&txn)
            .await
            .map_err(|e| storage(&e))?
        else {
            return Ok(false);
        };
        if record.is_locked || !DailyRecordService::is_stale(record.record_date, as_of) {
            return Ok(false);
        }

        lock_in_txn(&txn, &record, None, self.clock.now(), &RequestContext::default()).await?;
        txn.commit().await.map_err(|e| storage(&e))?;
        Ok(true)
    }
}

async fn load_with_site<C: ConnectionTrait>(
    conn: &C,
    record_id: Uuid,
) -> Result<(daily_records::Model, sites::Model), LedgerError> {
    let (record, site) = daily_records::Entity::find_by_id(record_id)
        .find_also_related(sites::Entity)
        .one(conn)
        .await
        .map_err(|e| storage(&e))?
        .ok_or(LedgerError::NotFound(record_id))?;
    let site = site.ok_or(LedgerError::SiteNotFound(record.site_id))?;
    Ok((record, site))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    record_id: Uuid,
) -> Result<Vec<daily_record_items::Model>, LedgerError> {
    daily_record_items::Entity::find()
        .filter(daily_record_items::Column::DailyRecordId.eq(record_id))
        .order_by_asc(daily_record_items::Column::CreatedAt)
        .order_by_asc(daily_record_items::Column::Id)
        .all(conn)
        .await
        .map_err(|e| storage(&e))
}

/// Worker types of a site; retired ones only when `active_only` is false.
async fn site_worker_types<C: ConnectionTrait>(
    conn: &C,
    site_id: Uuid,
    active_only: bool,
) -> Result<Vec<Uuid>, LedgerError> {
    let mut query = worker_types::Entity::find().filter(worker_types::Column::SiteId.eq(site_id));
    if active_only {
        query = query.filter(worker_types::Column::IsActive.eq(true));
    }
    Ok(query
        .all(conn)
        .await
        .map_err(|e| storage(&e))?
        .into_iter()
        .map(|wt| wt.id)
        .collect())
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    record_id: Uuid,
    items: &[DerivedItem],
    now: DateTime<Utc>,
) -> Result<Vec<daily_record_items::Model>, LedgerError> {
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        let model = daily_record_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            daily_record_id: Set(record_id),
            worker_type_id: Set(item.worker_type_id),
            worker_count: Set(item.worker_count),
            total_payment: Set(item.total_payment),
            payment_per_worker: Set(item.payment_per_worker),
            worker_names: Set(item
                .worker_names
                .as_ref()
                .map(|names| serde_json::json!(names))),
            attendance_notes: Set(item.attendance_notes.clone()),
            created_at: Set(now.into()),
        }
        .insert(conn)
        .await
        .map_err(|e| storage(&e))?;
        saved.push(model);
    }
    Ok(saved)
}

/// Recomputes `payment_per_worker` for kept items.
async fn rederive_items<C: ConnectionTrait>(
    conn: &C,
    items: &[daily_record_items::Model],
) -> Result<(), LedgerError> {
    for item in items {
        let fresh = derive_item(&as_input(item))?;
        if item.payment_per_worker != fresh.payment_per_worker {
            let mut active: daily_record_items::ActiveModel = item.clone().into();
            active.payment_per_worker = Set(fresh.payment_per_worker);
            active.update(conn).await.map_err(|e| storage(&e))?;
        }
    }
    Ok(())
}

/// Locks `record` on `conn` and writes its `lock` audit entry.
async fn lock_in_txn<C: ConnectionTrait>(
    conn: &C,
    record: &daily_records::Model,
    actor_id: Option<Uuid>,
    locked_at: DateTime<Utc>,
    ctx: &RequestContext,
) -> Result<daily_records::Model, LedgerError> {
    let result = daily_records::Entity::update_many()
        .col_expr(daily_records::Column::IsLocked, Expr::value(true))
        .col_expr(
            daily_records::Column::LockedAt,
            Expr::value(Some(locked_at.fixed_offset())),
        )
        .col_expr(daily_records::Column::Version, Expr::value(record.version + 1))
        .col_expr(
            daily_records::Column::UpdatedAt,
            Expr::value(locked_at.fixed_offset()),
        )
        .filter(daily_records::Column::Id.eq(record.id))
        .filter(daily_records::Column::Version.eq(record.version))
        .filter(daily_records::Column::IsLocked.eq(false))
        .exec(conn)
        .await
        .map_err(|e| storage(&e))?;
    if result.rows_affected == 0 {
        return Err(LedgerError::Conflict(record.id));
    }

    let locked = daily_records::Entity::find_by_id(record.id)
        .one(conn)
        .await
        .map_err(|e| storage(&e))?
        .ok_or(LedgerError::NotFound(record.id))?;
    let items = load_items(conn, record.id).await?;

    let description = if actor_id.is_some() {
        "Locked daily record"
    } else {
        "Auto-locked stale daily record"
    };
    AuditRepository::record(
        conn,
        AuditEntry::new(AuditAction::Lock, TABLE_NAME)
            .actor(actor_id)
            .record(record.id)
            .values(Some(snapshot(record, &items)), Some(snapshot(&locked, &items)))
            .description(description)
            .context(ctx)
            .at(locked_at),
    )
    .await?;

    Ok(locked)
}
