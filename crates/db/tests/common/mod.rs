//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use sitebook_core::access::{Actor, Role};
use sitebook_core::clock::FixedClock;
use sitebook_core::daily_record::{ItemInput, RecordFields};
use sitebook_db::migration::Migrator;
use sitebook_db::repositories::{
    CreateSiteInput, CreateUserInput, DailyRecordRepository, OpenRecordInput, SiteRepository,
    UserRepository, WorkerTypeRepository,
};
use sitebook_shared::config::{LedgerConfig, LockMode};

/// Seeded users, one site and one worker type.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub super_admin: Actor,
    pub site_admin: Actor,
    pub supervisor: Actor,
    pub other_supervisor: Actor,
    pub site_id: Uuid,
    pub other_site_id: Uuid,
    pub worker_type_id: Uuid,
}

/// Fresh in-memory database with the schema applied.
pub async fn connect() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    migrated(options).await
}

/// Fresh database in a temporary file, pooled over `connections` connections.
pub async fn connect_file(connections: u32) -> (DatabaseConnection, PathBuf) {
    let path = std::env::temp_dir().join(format!("sitebook-test-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(connections)
        .min_connections(1)
        .sqlx_logging(false);

    (migrated(options).await, path)
}

/// Deletes a database created by [`connect_file`] with its journal files.
pub fn remove_file_db(path: &Path) {
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

async fn migrated(options: ConnectOptions) -> DatabaseConnection {
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    db
}

async fn user(db: &DatabaseConnection, username: &str, role: Role) -> Actor {
    let created = UserRepository::new(db.clone())
        .create(CreateUserInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: format!("User {username}"),
            password_hash: "$argon2id$test_hash".to_string(),
            role,
        })
        .await
        .expect("Failed to create user");
    Actor::new(created.id, role)
}

pub async fn setup() -> Fixture {
    seed(connect().await).await
}

/// Seeds the standard fixture into `db`.
pub async fn seed(db: DatabaseConnection) -> Fixture {

    let super_admin = user(&db, "root", Role::SuperAdmin).await;
    let site_admin = user(&db, "admin", Role::SiteAdmin).await;
    let supervisor = user(&db, "sup", Role::Supervisor).await;
    let other_supervisor = user(&db, "sup2", Role::Supervisor).await;

    let sites = SiteRepository::new(db.clone());
    let site = sites
        .create(CreateSiteInput {
            name: "North Quarry".to_string(),
            code: "NQ".to_string(),
            location: Some("North ridge".to_string()),
            supervisor_id: Some(supervisor.user_id),
        })
        .await
        .expect("Failed to create site");
    let other_site = sites
        .create(CreateSiteInput {
            name: "South Pit".to_string(),
            code: "SP".to_string(),
            location: None,
            supervisor_id: Some(other_supervisor.user_id),
        })
        .await
        .expect("Failed to create site");

    let worker_type = WorkerTypeRepository::new(db.clone())
        .create(site.id, "Loader", Decimal::from(100))
        .await
        .expect("Failed to create worker type");

    Fixture {
        db,
        super_admin,
        site_admin,
        supervisor,
        other_supervisor,
        site_id: site.id,
        other_site_id: other_site.id,
        worker_type_id: worker_type.id,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Ledger repository whose "today" is `today`.
pub fn ledger(fx: &Fixture, today: NaiveDate, lock_mode: LockMode) -> DailyRecordRepository {
    ledger_with(fx, today, LedgerConfig {
        lock_mode,
        ..LedgerConfig::default()
    })
}

pub fn ledger_with(fx: &Fixture, today: NaiveDate, config: LedgerConfig) -> DailyRecordRepository {
    DailyRecordRepository::new(fx.db.clone(), config, Arc::new(FixedClock::on(today)))
}

pub fn item(worker_type_id: Uuid, worker_count: i32, total_payment: i64) -> ItemInput {
    ItemInput {
        worker_type_id,
        worker_count,
        total_payment: Decimal::from(total_payment),
        worker_names: None,
        attendance_notes: None,
    }
}

pub fn open_input(fx: &Fixture, record_date: NaiveDate, workers: i32, payment: i64) -> OpenRecordInput {
    OpenRecordInput {
        site_id: fx.site_id,
        record_date,
        fields: RecordFields::default(),
        items: vec![item(fx.worker_type_id, workers, payment)],
    }
}

/// Reads a decimal out of an audit snapshot, which stores them as strings.
pub fn json_decimal(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
