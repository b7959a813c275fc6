//! Daily record lifecycle decisions.
//!
//! The service is stateless and pure. It decides whether an operation is
//! allowed and how it applies; the repository then performs the write and the
//! audit insert on one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::access::{AccessPolicy, Action, Actor, Resource};
use crate::daily_record::error::LedgerError;
use crate::daily_record::types::{LockPlan, RecordFields, RecordPatch, RecordState, UpdatePlan};

/// Stateless service for the open / update / correct / lock lifecycle.
pub struct DailyRecordService;

impl DailyRecordService {
    /// Checks that `actor` may open a record on a site and returns the
    /// supervisor the record is filed under.
    ///
    /// Admins may open for any site; the record then belongs to the site's
    /// supervisor, or to the admin when the site has none.
    pub fn authorize_open(
        actor: &Actor,
        site_supervisor_id: Option<Uuid>,
    ) -> Result<Uuid, LedgerError> {
        AccessPolicy::evaluate(
            actor,
            Action::Create,
            &Resource::DailyRecord { site_supervisor_id },
        )
        .require(Action::Create)?;

        Ok(Self::resolve_supervisor(actor, site_supervisor_id))
    }

    /// The supervisor a new record is filed under.
    #[must_use]
    pub fn resolve_supervisor(actor: &Actor, site_supervisor_id: Option<Uuid>) -> Uuid {
        if actor.is_admin() {
            site_supervisor_id.unwrap_or(actor.user_id)
        } else {
            actor.user_id
        }
    }

    /// Checks that `actor` may read records of a site.
    pub fn authorize_read(actor: &Actor, site_supervisor_id: Option<Uuid>) -> Result<(), LedgerError> {
        AccessPolicy::evaluate(
            actor,
            Action::Read,
            &Resource::DailyRecord { site_supervisor_id },
        )
        .require(Action::Read)?;
        Ok(())
    }

    /// Rejects record dates after `today`.
    pub fn validate_date(record_date: NaiveDate, today: NaiveDate) -> Result<(), LedgerError> {
        if record_date > today {
            return Err(LedgerError::FutureDate(record_date));
        }
        Ok(())
    }

    /// True if a record dated `record_date` should be locked on `today`.
    #[must_use]
    pub fn is_stale(record_date: NaiveDate, today: NaiveDate) -> bool {
        record_date < today
    }

    /// Decides how `patch` applies to a record.
    ///
    /// Checks, in order: expected version, then for locked records the
    /// correction reason, the actor's privilege and the correction limit.
    /// Unlocked records only need `Update` permission on the site.
    pub fn plan_update(
        actor: &Actor,
        state: &RecordState,
        patch: &RecordPatch,
        max_corrections: Option<i32>,
    ) -> Result<UpdatePlan, LedgerError> {
        if let Some(expected) = patch.expected_version
            && expected != state.version
        {
            return Err(LedgerError::Conflict(state.id));
        }

        let resource = Resource::DailyRecord {
            site_supervisor_id: state.site_supervisor_id,
        };

        if !state.is_locked {
            AccessPolicy::evaluate(actor, Action::Update, &resource).require(Action::Update)?;
            return Ok(UpdatePlan::Direct);
        }

        let reason = patch
            .correction_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(LedgerError::LockedWithoutReason)?;

        AccessPolicy::evaluate(actor, Action::Correct, &resource).require(Action::Correct)?;

        if let Some(limit) = max_corrections
            && state.correction_count >= limit
        {
            return Err(LedgerError::CorrectionLimitReached { limit });
        }

        Ok(UpdatePlan::Correction {
            sequence: state.correction_count + 1,
            reason: reason.to_string(),
        })
    }

    /// Decides whether a lock request changes anything.
    pub fn plan_lock(
        actor: &Actor,
        state: &RecordState,
        now: DateTime<Utc>,
    ) -> Result<LockPlan, LedgerError> {
        AccessPolicy::evaluate(
            actor,
            Action::Lock,
            &Resource::DailyRecord {
                site_supervisor_id: state.site_supervisor_id,
            },
        )
        .require(Action::Lock)?;

        if state.is_locked {
            Ok(LockPlan::AlreadyLocked)
        } else {
            Ok(LockPlan::Lock { locked_at: now })
        }
    }

    /// Returns `fields` with the patch's scalar changes applied.
    #[must_use]
    pub fn apply(fields: &RecordFields, patch: &RecordPatch) -> RecordFields {
        RecordFields {
            total_production: patch.total_production.or(fields.total_production),
            production_unit: patch
                .production_unit
                .clone()
                .unwrap_or_else(|| fields.production_unit.clone()),
            tasks_completed: patch.tasks_completed.or(fields.tasks_completed),
            weather_conditions: patch
                .weather_conditions
                .clone()
                .or_else(|| fields.weather_conditions.clone()),
            supervisor_notes: patch
                .supervisor_notes
                .clone()
                .or_else(|| fields.supervisor_notes.clone()),
        }
    }
}
