//! Property-based tests for DailyRecordService and payroll derivation.

use chrono::{Days, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::access::{Actor, Role};
use crate::daily_record::error::LedgerError;
use crate::daily_record::payroll::derive_item;
use crate::daily_record::service::DailyRecordService;
use crate::daily_record::types::{ItemInput, LockPlan, RecordPatch, RecordState, UpdatePlan};

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Supervisor),
        Just(Role::SiteAdmin),
        Just(Role::SuperAdmin),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .unwrap()
    })
}

fn arb_state(supervisor: Uuid) -> impl Strategy<Value = RecordState> {
    (arb_uuid(), any::<bool>(), 0i32..50, 1i32..1000, arb_date()).prop_map(
        move |(id, is_locked, correction_count, version, record_date)| RecordState {
            id,
            is_locked,
            correction_count,
            version,
            record_date,
            site_supervisor_id: Some(supervisor),
        },
    )
}

/// Blank or whitespace-only reasons.
fn arb_blank_reason() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[ \t]{0,5}".prop_map(Some)]
}

fn arb_reason() -> impl Strategy<Value = String> {
    "[a-z]{1,20}( [a-z]{1,10}){0,3}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A locked record without a reason is rejected regardless of role.
    #[test]
    fn prop_locked_without_reason_always_fails(
        actor_id in arb_uuid(),
        role in arb_role(),
        blank in arb_blank_reason(),
        state in arb_uuid().prop_flat_map(arb_state),
    ) {
        let mut state = state;
        state.is_locked = true;
        let actor = Actor::new(actor_id, role);
        let patch = RecordPatch { correction_reason: blank, ..RecordPatch::default() };
        let result = DailyRecordService::plan_update(&actor, &state, &patch, None);
        prop_assert!(matches!(result, Err(LedgerError::LockedWithoutReason)));
    }

    /// A supervisor can never correct a locked record, even their own.
    #[test]
    fn prop_supervisor_correction_insufficient(
        supervisor in arb_uuid(),
        reason in arb_reason(),
    ) {
        let actor = Actor::new(supervisor, Role::Supervisor);
        let state = RecordState {
            id: Uuid::new_v4(),
            is_locked: true,
            correction_count: 0,
            version: 1,
            record_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            site_supervisor_id: Some(supervisor),
        };
        let patch = RecordPatch { correction_reason: Some(reason), ..RecordPatch::default() };
        let result = DailyRecordService::plan_update(&actor, &state, &patch, None);
        prop_assert!(matches!(result, Err(LedgerError::InsufficientPrivilege(_))));
    }

    /// Admin corrections advance the correction count by exactly one.
    #[test]
    fn prop_correction_sequence_increments(
        admin_id in arb_uuid(),
        reason in arb_reason(),
        state in arb_uuid().prop_flat_map(arb_state),
    ) {
        let mut state = state;
        state.is_locked = true;
        let actor = Actor::new(admin_id, Role::SiteAdmin);
        let patch = RecordPatch { correction_reason: Some(reason), ..RecordPatch::default() };
        let plan = DailyRecordService::plan_update(&actor, &state, &patch, None).unwrap();
        match plan {
            UpdatePlan::Correction { sequence, .. } => {
                prop_assert_eq!(sequence, state.correction_count + 1);
                prop_assert!(sequence > state.correction_count);
            }
            UpdatePlan::Direct => prop_assert!(false, "expected correction"),
        }
    }

    /// Any expected version other than the stored one conflicts.
    #[test]
    fn prop_version_mismatch_conflicts(
        actor_id in arb_uuid(),
        role in arb_role(),
        state in arb_uuid().prop_flat_map(arb_state),
        delta in 1i32..10,
    ) {
        let actor = Actor::new(actor_id, role);
        let patch = RecordPatch {
            expected_version: Some(state.version + delta),
            correction_reason: Some("reason".to_string()),
            ..RecordPatch::default()
        };
        let result = DailyRecordService::plan_update(&actor, &state, &patch, None);
        prop_assert!(matches!(result, Err(LedgerError::Conflict(_))));
    }

    /// Locking twice leaves the second call a no-op.
    #[test]
    fn prop_lock_idempotent(
        admin_id in arb_uuid(),
        state in arb_uuid().prop_flat_map(arb_state),
    ) {
        let actor = Actor::new(admin_id, Role::SuperAdmin);
        let mut state = state;
        let now = Utc::now();
        if let LockPlan::Lock { .. } = DailyRecordService::plan_lock(&actor, &state, now).unwrap() {
            state.is_locked = true;
        }
        prop_assert_eq!(
            DailyRecordService::plan_lock(&actor, &state, now).unwrap(),
            LockPlan::AlreadyLocked
        );
    }

    /// Per-worker payment times worker count is within half a cent per worker of the total.
    #[test]
    fn prop_payment_per_worker_close_to_total(
        worker_count in 1i32..500,
        cents in 0i64..10_000_000,
    ) {
        let total_payment = Decimal::new(cents, 2);
        let item = ItemInput {
            worker_type_id: Uuid::nil(),
            worker_count,
            total_payment,
            worker_names: None,
            attendance_notes: None,
        };
        let derived = derive_item(&item).unwrap();
        let reconstructed = derived.payment_per_worker * Decimal::from(worker_count);
        let tolerance = Decimal::new(5, 3) * Decimal::from(worker_count);
        prop_assert!((reconstructed - total_payment).abs() <= tolerance);
        prop_assert!(derived.payment_per_worker.scale() <= 2);
    }

    /// Stale means strictly earlier than today.
    #[test]
    fn prop_stale_iff_before_today(record_date in arb_date(), today in arb_date()) {
        prop_assert_eq!(
            DailyRecordService::is_stale(record_date, today),
            record_date < today
        );
    }
}
