//! Integration tests for the audit trail repository.

mod common;

use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use serde_json::json;

use common::{Fixture, date, ledger, open_input, setup};
use sitebook_core::access::AccessError;
use sitebook_core::audit::{AuditAction, AuditEntry, AuditFilter, RequestContext};
use sitebook_core::daily_record::{RecordPatch, TABLE_NAME};
use sitebook_db::entities::{sea_orm_active_enums, users};
use sitebook_db::{AuditRepository, repositories::AuditError};
use sitebook_shared::config::LockMode;
use sitebook_shared::types::PageRequest;

#[tokio::test]
async fn test_list_filters_newest_first() {
    let fx = setup().await;
    let repo = AuditRepository::new(fx.db.clone());

    for n in 0..3 {
        repo.log(
            AuditEntry::new(AuditAction::Login, "users")
                .actor(Some(fx.supervisor.user_id))
                .record(fx.supervisor.user_id)
                .description(format!("login {n}")),
        )
        .await
        .expect("Failed to log entry");
    }
    repo.log(
        AuditEntry::new(AuditAction::Export, "daily_records")
            .actor(Some(fx.site_admin.user_id))
            .values(None, Some(json!({ "format": "csv" }))),
    )
    .await
    .expect("Failed to log entry");

    let logins = repo
        .list(
            &fx.site_admin,
            &AuditFilter {
                action: Some(AuditAction::Login),
                ..AuditFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("Failed to list entries");
    assert_eq!(logins.meta.total, 3);
    assert_eq!(logins.data[0].description.as_deref(), Some("login 2"));
    assert!(logins.data.iter().all(|e| e.user_id == Some(fx.supervisor.user_id)));

    let by_user = repo
        .list(
            &fx.super_admin,
            &AuditFilter {
                user_id: Some(fx.site_admin.user_id),
                ..AuditFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .expect("Failed to list entries");
    assert_eq!(by_user.meta.total, 1);
    assert_eq!(by_user.data[0].action, sea_orm_active_enums::AuditAction::Export);

    let paged = repo
        .list(
            &fx.site_admin,
            &AuditFilter::default(),
            PageRequest {
                page: 2,
                per_page: 3,
            },
        )
        .await
        .expect("Failed to list entries");
    assert_eq!(paged.meta.total, 4);
    assert_eq!(paged.data.len(), 1);
}

#[tokio::test]
async fn test_supervisor_cannot_read_trail() {
    let fx = setup().await;
    let repo = AuditRepository::new(fx.db.clone());

    let err = repo
        .list(&fx.supervisor, &AuditFilter::default(), PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Denied(AccessError::Denied { .. })));
    assert_eq!(err.status_code(), 403);

    let err = repo
        .history(&fx.supervisor, TABLE_NAME, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "insufficient_privilege");
}

#[tokio::test]
async fn test_correction_stats_per_supervisor() {
    let fx = setup().await;
    let ctx = RequestContext::default();
    let today = date(2024, 1, 10);
    let ledger = ledger(&fx, today, LockMode::Scheduled);

    let record = ledger
        .open(&fx.supervisor, open_input(&fx, today, 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    ledger
        .lock(&fx.site_admin, record.record.id, &ctx)
        .await
        .expect("Failed to lock record");
    for reason in ["miscount", "late sheet"] {
        ledger
            .update(
                &fx.site_admin,
                record.record.id,
                RecordPatch {
                    supervisor_notes: Some(reason.to_string()),
                    correction_reason: Some(reason.to_string()),
                    ..RecordPatch::default()
                },
                &ctx,
            )
            .await
            .expect("Failed to correct record");
    }

    let stats = AuditRepository::new(fx.db.clone())
        .correction_stats(&fx.site_admin, None, None)
        .await
        .expect("Failed to load stats");
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].supervisor_id, fx.supervisor.user_id);
    assert_eq!(stats[0].supervisor_name.as_deref(), Some("User sup"));
    assert_eq!(stats[0].corrections, 2);
    assert_eq!(stats[0].records_corrected, 1);
}

#[tokio::test]
async fn test_entries_survive_user_deletion() {
    let fx = setup().await;
    let repo = AuditRepository::new(fx.db.clone());

    let entry = repo
        .log(
            AuditEntry::new(AuditAction::Logout, "users")
                .actor(Some(fx.other_supervisor.user_id))
                .record(fx.other_supervisor.user_id),
        )
        .await
        .expect("Failed to log entry");

    sitebook_db::SiteRepository::new(fx.db.clone())
        .assign_supervisor(fx.other_site_id, None)
        .await
        .expect("Failed to unassign supervisor");
    users::Entity::delete_by_id(fx.other_supervisor.user_id)
        .exec(&fx.db)
        .await
        .expect("Failed to delete user");

    let history = repo
        .history(&fx.site_admin, "users", fx.other_supervisor.user_id)
        .await
        .expect("Failed to load history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, entry.id);
    assert!(history[0].user_id.is_none());
}

fn noon(day: u32) -> DateTime<Utc> {
    date(2024, 1, day)
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
        .and_utc()
}

/// Create, lock and correct on Jan 10; a login and a system export on Jan 9.
async fn seed_activity(fx: &Fixture) {
    let ctx = RequestContext::default();
    let ledger = ledger(fx, date(2024, 1, 10), LockMode::Scheduled);
    let record = ledger
        .open(&fx.supervisor, open_input(fx, date(2024, 1, 10), 5, 500), &ctx)
        .await
        .expect("Failed to open record");
    ledger
        .lock(&fx.site_admin, record.record.id, &ctx)
        .await
        .expect("Failed to lock record");
    ledger
        .update(
            &fx.site_admin,
            record.record.id,
            RecordPatch {
                supervisor_notes: Some("recount".to_string()),
                correction_reason: Some("miscount".to_string()),
                ..RecordPatch::default()
            },
            &ctx,
        )
        .await
        .expect("Failed to correct record");

    let repo = AuditRepository::new(fx.db.clone());
    repo.log(
        AuditEntry::new(AuditAction::Login, "users")
            .actor(Some(fx.supervisor.user_id))
            .record(fx.supervisor.user_id)
            .at(noon(9)),
    )
    .await
    .expect("Failed to log entry");
    repo.log(AuditEntry::new(AuditAction::Export, TABLE_NAME).at(noon(9)))
        .await
        .expect("Failed to log entry");
}

#[tokio::test]
async fn test_statistics_over_whole_trail() {
    let fx = setup().await;
    seed_activity(&fx).await;

    let stats = AuditRepository::new(fx.db.clone())
        .statistics(&fx.super_admin, None, None)
        .await
        .expect("Failed to load statistics");

    assert_eq!(stats.overall.total_actions, 5);
    assert_eq!(stats.overall.active_users, 2);
    assert_eq!(stats.overall.tables_affected, 2);
    assert_eq!(stats.overall.records_affected, 2);

    let actions: Vec<_> = stats.by_action.iter().map(|a| (a.action, a.count)).collect();
    assert_eq!(
        actions,
        vec![
            (AuditAction::Correction, 1),
            (AuditAction::Create, 1),
            (AuditAction::Export, 1),
            (AuditAction::Lock, 1),
            (AuditAction::Login, 1),
        ]
    );

    let tables: Vec<_> = stats
        .by_table
        .iter()
        .map(|t| (t.table_name.as_str(), t.count))
        .collect();
    assert_eq!(tables, vec![(TABLE_NAME, 4), ("users", 1)]);

    assert_eq!(stats.by_user.len(), 3);
    let admin = stats
        .by_user
        .iter()
        .find(|u| u.user_id == Some(fx.site_admin.user_id))
        .expect("admin listed");
    assert_eq!(admin.username.as_deref(), Some("admin"));
    assert_eq!(admin.full_name.as_deref(), Some("User admin"));
    assert_eq!(admin.role, Some(sea_orm_active_enums::UserRole::SiteAdmin));
    assert_eq!(admin.action_count, 2);
    let system = &stats.by_user[2];
    assert!(system.user_id.is_none());
    assert!(system.username.is_none());
    assert_eq!(system.action_count, 1);

    let days: Vec<_> = stats
        .daily_activity
        .iter()
        .map(|d| (d.date, d.count))
        .collect();
    assert_eq!(days, vec![(date(2024, 1, 10), 3), (date(2024, 1, 9), 2)]);
}

#[tokio::test]
async fn test_statistics_within_range() {
    let fx = setup().await;
    seed_activity(&fx).await;
    let repo = AuditRepository::new(fx.db.clone());

    let from = date(2024, 1, 10)
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
        .and_utc();
    let stats = repo
        .statistics(&fx.site_admin, Some(from), None)
        .await
        .expect("Failed to load statistics");
    assert_eq!(stats.overall.total_actions, 3);
    assert_eq!(stats.overall.active_users, 2);
    assert_eq!(stats.overall.tables_affected, 1);
    assert_eq!(stats.overall.records_affected, 1);
    assert_eq!(stats.daily_activity.len(), 1);
    assert!(stats.by_user.iter().all(|u| u.user_id.is_some()));

    let empty = repo
        .statistics(&fx.site_admin, None, Some(noon(9)))
        .await
        .expect("Failed to load statistics");
    assert_eq!(empty.overall.total_actions, 0);
    assert!(empty.by_action.is_empty());
    assert!(empty.by_user.is_empty());

    let err = repo
        .statistics(&fx.supervisor, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}
