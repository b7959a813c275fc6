//! Integration tests for the daily record ledger.
//!
//! Run against an in-memory SQLite database with the full schema applied.

mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

use common::{date, item, json_decimal, ledger, ledger_with, open_input, setup};
use sitebook_core::audit::RequestContext;
use sitebook_core::daily_record::{LedgerError, RecordFields, RecordPatch, TABLE_NAME};
use sitebook_db::AuditRepository;
use sitebook_db::repositories::{OpenRecordInput, WorkerTypeRepository};
use sitebook_db::entities::{audit_logs, sea_orm_active_enums, worker_types};
use sitebook_shared::config::{LedgerConfig, LockMode};
use sitebook_shared::types::PageRequest;

async fn audit_count(db: &sea_orm::DatabaseConnection, record_id: uuid::Uuid) -> u64 {
    audit_logs::Entity::find()
        .filter(audit_logs::Column::RecordId.eq(record_id))
        .count(db)
        .await
        .expect("Failed to count audit entries")
}

#[tokio::test]
async fn test_open_update_lock_and_correct() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext {
        ip_address: Some("10.0.0.7".to_string()),
        user_agent: Some("tests".to_string()),
    };

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    assert_eq!(opened.items.len(), 1);
    assert_eq!(opened.items[0].payment_per_worker, Decimal::from(100));
    assert_eq!(opened.record.version, 1);
    assert_eq!(opened.record.supervisor_id, fx.supervisor.user_id);
    assert_eq!(opened.totals.total_workers, 5);
    assert!(!opened.record.is_locked);

    let updated = repo
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                items: Some(vec![item(fx.worker_type_id, 5, 600)]),
                expected_version: Some(1),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to update record");
    assert_eq!(updated.record.version, 2);
    assert_eq!(updated.items[0].payment_per_worker, Decimal::from(120));

    let locked = repo
        .lock(&fx.site_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to lock record");
    assert!(locked.record.is_locked);
    assert!(locked.record.locked_at.is_some());

    let err = repo
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(4),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LockedWithoutReason));

    let corrected = repo
        .update(
            &fx.site_admin,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(4),
                correction_reason: Some("  miscount ".to_string()),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to correct record");
    assert_eq!(corrected.record.correction_count, 1);
    assert_eq!(corrected.record.last_correction_reason.as_deref(), Some("miscount"));
    assert_eq!(corrected.record.tasks_completed, Some(4));
    assert!(corrected.record.is_locked);

    let history = AuditRepository::new(fx.db.clone())
        .history(&fx.site_admin, TABLE_NAME, opened.record.id)
        .await
        .expect("Failed to load history");
    let actions: Vec<_> = history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            sea_orm_active_enums::AuditAction::Create,
            sea_orm_active_enums::AuditAction::Update,
            sea_orm_active_enums::AuditAction::Lock,
            sea_orm_active_enums::AuditAction::Correction,
        ]
    );

    let update_entry = &history[1];
    let old = update_entry.old_values.as_ref().expect("old values");
    let new = update_entry.new_values.as_ref().expect("new values");
    assert_eq!(json_decimal(&old["items"][0]["total_payment"]), Decimal::from(500));
    assert_eq!(json_decimal(&new["items"][0]["total_payment"]), Decimal::from(600));
    assert_eq!(update_entry.user_id, Some(fx.supervisor.user_id));
    assert_eq!(update_entry.ip_address.as_deref(), Some("10.0.0.7"));

    let correction = &history[3];
    assert_eq!(correction.user_id, Some(fx.site_admin.user_id));
    assert_eq!(correction.correction_reason.as_deref(), Some("miscount"));
    assert_eq!(correction.correction_count, Some(1));
}

#[tokio::test]
async fn test_duplicate_record_rejected() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    repo.open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let err = repo
        .open(&fx.site_admin, open_input(&fx, today, 3, 300), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateRecord { site_id, .. } if site_id == fx.site_id));
}

#[tokio::test]
async fn test_future_date_rejected() {
    let fx = setup().await;
    let repo = ledger(&fx, date(2024, 1, 10), LockMode::Both);

    let err = repo
        .open(
            &fx.supervisor,
            open_input(&fx, date(2024, 1, 11), 5, 500),
            &RequestContext::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::FutureDate(_)));
}

#[tokio::test]
async fn test_supervisor_scoped_to_own_site() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    let err = repo
        .open(&fx.other_supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AuthorizationError(_)));

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let err = repo.find(&fx.other_supervisor, opened.record.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::AuthorizationError(_)));

    let found = repo
        .find(&fx.supervisor, opened.record.id)
        .await
        .expect("Failed to find record");
    assert_eq!(found.record.id, opened.record.id);
}

#[tokio::test]
async fn test_invalid_items_rejected() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    let err = repo
        .open(&fx.supervisor, open_input(&fx, today, 0, 500), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidItem(_)));

    let mut foreign = open_input(&fx, today, 5, 500);
    foreign.items = vec![item(uuid::Uuid::new_v4(), 5, 500)];
    let err = repo.open(&fx.supervisor, foreign, &ctx).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidItem(_)));

    let count = sitebook_db::entities::daily_records::Entity::find()
        .count(&fx.db)
        .await
        .expect("Failed to count records");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_stale_version_conflicts_without_audit() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    repo.update(
        &fx.supervisor,
        opened.record.id,
        RecordPatch {
            tasks_completed: Some(2),
            expected_version: Some(1),
            ..RecordPatch::default()
        },
        &ctx,
    )
    .await
    .expect("Failed to update record");

    let before = audit_count(&fx.db, opened.record.id).await;
    let err = repo
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(3),
                expected_version: Some(1),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(id) if id == opened.record.id));
    assert_eq!(audit_count(&fx.db, opened.record.id).await, before);

    let current = repo
        .find(&fx.supervisor, opened.record.id)
        .await
        .expect("Failed to find record");
    assert_eq!(current.record.tasks_completed, Some(2));
    assert_eq!(current.record.version, 2);
}

#[tokio::test]
async fn test_lock_is_idempotent() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let first = repo
        .lock(&fx.site_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to lock record");
    let entries = audit_count(&fx.db, opened.record.id).await;

    let second = repo
        .lock(&fx.super_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to relock record");
    assert_eq!(second.record.version, first.record.version);
    assert_eq!(second.record.locked_at, first.record.locked_at);
    assert_eq!(audit_count(&fx.db, opened.record.id).await, entries);
}

#[tokio::test]
async fn test_supervisor_cannot_lock_or_correct() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Both);
    let ctx = RequestContext::default();

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let err = repo.lock(&fx.supervisor, opened.record.id, &ctx).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientPrivilege(_)));

    repo.lock(&fx.site_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to lock record");

    let err = repo
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                correction_reason: Some("wrong count".to_string()),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientPrivilege(_)));
}

#[tokio::test]
async fn test_auto_lock_stale_records() {
    let fx = setup().await;
    let ctx = RequestContext::default();
    let repo = ledger(&fx, date(2024, 1, 12), LockMode::Scheduled);

    let stale = repo
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 10), 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    let already_locked = repo
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 9), 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    repo.lock(&fx.site_admin, already_locked.record.id, &ctx)
        .await
        .expect("Failed to lock record");
    let current = repo
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 12), 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let locked = repo
        .auto_lock_stale(date(2024, 1, 12))
        .await
        .expect("Failed to auto-lock");
    assert_eq!(locked, vec![stale.record.id]);

    let record = repo
        .find(&fx.site_admin, stale.record.id)
        .await
        .expect("Failed to find record");
    assert!(record.record.is_locked);
    let record = repo
        .find(&fx.site_admin, current.record.id)
        .await
        .expect("Failed to find record");
    assert!(!record.record.is_locked);

    let history = AuditRepository::new(fx.db.clone())
        .history(&fx.site_admin, TABLE_NAME, stale.record.id)
        .await
        .expect("Failed to load history");
    let lock_entry = history.last().expect("lock entry");
    assert_eq!(lock_entry.action, sea_orm_active_enums::AuditAction::Lock);
    assert!(lock_entry.user_id.is_none());

    let again = repo
        .auto_lock_stale_today()
        .await
        .expect("Failed to auto-lock");
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_lazy_lock_on_access() {
    let fx = setup().await;
    let ctx = RequestContext::default();

    let opened = ledger(&fx, date(2024, 1, 10), LockMode::Lazy)
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 10), 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let next_day = ledger(&fx, date(2024, 1, 11), LockMode::Lazy);
    let err = next_day
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(1),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LockedWithoutReason));

    let record = next_day
        .find(&fx.supervisor, opened.record.id)
        .await
        .expect("Failed to find record");
    assert!(record.record.is_locked);
    assert_eq!(record.record.tasks_completed, None);
}

#[tokio::test]
async fn test_scheduled_mode_does_not_lock_on_access() {
    let fx = setup().await;
    let ctx = RequestContext::default();

    let opened = ledger(&fx, date(2024, 1, 10), LockMode::Scheduled)
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 10), 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let updated = ledger(&fx, date(2024, 1, 11), LockMode::Scheduled)
        .update(
            &fx.supervisor,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(1),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to update record");
    assert!(!updated.record.is_locked);
    assert_eq!(updated.record.tasks_completed, Some(1));
}

#[tokio::test]
async fn test_correction_limit() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger_with(
        &fx,
        today,
        LedgerConfig {
            lock_mode: LockMode::Scheduled,
            max_corrections: Some(1),
            ..LedgerConfig::default()
        },
    );
    let ctx = RequestContext::default();

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    repo.lock(&fx.site_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to lock record");

    let patch = RecordPatch {
        items: Some(vec![item(fx.worker_type_id, 4, 500)]),
        correction_reason: Some("one worker left early".to_string()),
        ..RecordPatch::default()
    };
    let corrected = repo
        .update(&fx.site_admin, opened.record.id, patch.clone(), &ctx)
        .await
        .expect("Failed to correct record");
    assert_eq!(corrected.items[0].payment_per_worker, Decimal::new(12500, 2));

    let err = repo
        .update(&fx.site_admin, opened.record.id, patch, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CorrectionLimitReached { limit: 1 }));
}

#[tokio::test]
async fn test_list_for_site_and_summary() {
    let fx = setup().await;
    let ctx = RequestContext::default();
    let repo = ledger(&fx, date(2024, 1, 12), LockMode::Scheduled);

    for day in [5, 10, 11, 12] {
        repo.open(&fx.supervisor, open_input(&fx, date(2024, 1, day), 5, 500), &ctx)
            .await
            .expect("Failed to open record");
    }
    let driller = WorkerTypeRepository::new(fx.db.clone())
        .create(fx.other_site_id, "Driller", Decimal::from(80))
        .await
        .expect("Failed to create worker type");
    repo.open(
        &fx.site_admin,
        OpenRecordInput {
            site_id: fx.other_site_id,
            record_date: date(2024, 1, 11),
            fields: RecordFields::default(),
            items: vec![item(driller.id, 2, 160)],
        },
        &ctx,
    )
    .await
    .expect("Failed to open record");

    let page = repo
        .list_for_site(
            &fx.supervisor,
            fx.site_id,
            Some(date(2024, 1, 11)),
            None,
            PageRequest::default(),
        )
        .await
        .expect("Failed to list records");
    assert_eq!(page.meta.total, 2);
    assert_eq!(page.data[0].record_date, date(2024, 1, 12));

    let err = repo
        .list_for_site(&fx.other_supervisor, fx.site_id, None, None, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AuthorizationError(_)));

    let summary = repo
        .daily_summary(&fx.site_admin, date(2024, 1, 12))
        .await
        .expect("Failed to summarize");
    assert_eq!(summary.record_count, 1);
    assert_eq!(summary.sites_with_records, 1);
    assert_eq!(summary.total_workers, 5);
    assert_eq!(summary.total_payment, Decimal::from(500));
    assert_eq!(summary.missing_sites.len(), 1);
    assert_eq!(summary.missing_sites[0].site_id, fx.other_site_id);

    let recent: Vec<_> = summary
        .recent_activity
        .iter()
        .map(|day| (day.date, day.record_count, day.total_workers))
        .collect();
    assert_eq!(
        recent,
        vec![
            (date(2024, 1, 12), 1, 5),
            (date(2024, 1, 11), 2, 7),
            (date(2024, 1, 10), 1, 5),
        ]
    );
    assert_eq!(summary.recent_activity[1].total_payment, Decimal::from(660));

    let quiet = repo
        .daily_summary(&fx.site_admin, date(2024, 1, 9))
        .await
        .expect("Failed to summarize");
    assert_eq!(quiet.record_count, 0);
    assert_eq!(quiet.missing_sites.len(), 2);
    assert_eq!(quiet.recent_activity.len(), 1);
    assert_eq!(quiet.recent_activity[0].date, date(2024, 1, 5));

    let err = repo
        .daily_summary(&fx.supervisor, date(2024, 1, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientPrivilege(_)));
}

#[tokio::test]
async fn test_correction_accepts_retired_worker_type() {
    let fx = setup().await;
    let today = date(2024, 1, 10);
    let repo = ledger(&fx, today, LockMode::Scheduled);
    let ctx = RequestContext::default();

    let opened = repo
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    repo.lock(&fx.site_admin, opened.record.id, &ctx)
        .await
        .expect("Failed to lock record");

    let loader = worker_types::Entity::find_by_id(fx.worker_type_id)
        .one(&fx.db)
        .await
        .expect("Failed to load worker type")
        .expect("worker type exists");
    let mut retired: worker_types::ActiveModel = loader.into();
    retired.is_active = Set(false);
    retired.update(&fx.db).await.expect("Failed to retire worker type");

    let corrected = repo
        .update(
            &fx.site_admin,
            opened.record.id,
            RecordPatch {
                items: Some(vec![item(fx.worker_type_id, 4, 400)]),
                correction_reason: Some("miscount".to_string()),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to correct record");
    assert_eq!(corrected.record.correction_count, 1);
    assert_eq!(corrected.items.len(), 1);
    assert_eq!(corrected.items[0].worker_count, 4);

    let err = repo
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 9), 5, 500), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidItem(_)));
}

#[tokio::test]
async fn test_audit_entries_use_ledger_clock() {
    let fx = setup().await;
    let ctx = RequestContext::default();

    let opened = ledger(&fx, date(2024, 1, 10), LockMode::Lazy)
        .open(&fx.supervisor, open_input(&fx, date(2024, 1, 10), 5, 500), &ctx)
        .await
        .expect("Failed to open record");

    let later = ledger(&fx, date(2024, 1, 12), LockMode::Lazy);
    later
        .update(
            &fx.site_admin,
            opened.record.id,
            RecordPatch {
                tasks_completed: Some(3),
                correction_reason: Some("late sheet".to_string()),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to correct record");

    let history = AuditRepository::new(fx.db.clone())
        .history(&fx.site_admin, TABLE_NAME, opened.record.id)
        .await
        .expect("Failed to load history");
    let stamps: Vec<_> = history
        .iter()
        .map(|e| (e.action, e.created_at.with_timezone(&Utc)))
        .collect();
    let noon = |day| {
        date(2024, 1, day)
            .and_hms_opt(12, 0, 0)
            .expect("valid time")
            .and_utc()
    };
    assert_eq!(
        stamps,
        vec![
            (sea_orm_active_enums::AuditAction::Create, noon(10)),
            (sea_orm_active_enums::AuditAction::Lock, noon(12)),
            (sea_orm_active_enums::AuditAction::Correction, noon(12)),
        ]
    );
    assert_eq!(later.clock().now(), noon(12));
    assert!(
        history[2]
            .description
            .as_deref()
            .is_some_and(|d| d.contains("tasks_completed"))
    );
}
