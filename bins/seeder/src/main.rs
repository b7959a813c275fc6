//! Database seeder for Sitebook development and testing.
//!
//! Seeds one user per role, a site assigned to the supervisor, and the
//! site's worker types. Running it twice leaves existing rows alone.
//!
//! Usage: cargo run --bin seeder
//!
//! `SEED_PASSWORD` sets the password of every seeded user.

use anyhow::Context;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use sitebook_core::access::Role;
use sitebook_core::auth::hash_password;
use sitebook_db::migration::Migrator;
use sitebook_db::repositories::{
    CreateSiteInput, CreateUserInput, SiteRepository, UserRepository, WorkerTypeRepository,
};
use sitebook_shared::config::DatabaseConfig;

const DEFAULT_PASSWORD: &str = "changeme123";

/// Worker types seeded on the demo site, with daily rates.
const WORKER_TYPES: [(&str, i64); 3] = [("Loader", 100), ("Driller", 150), ("Driver", 120)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;
    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());

    println!("Connecting to database...");
    let db = sitebook_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
        acquire_timeout_secs: 10,
    })
    .await
    .context("Failed to connect to database")?;

    println!("Applying migrations...");
    Migrator::up(&db, None).await?;

    println!("Seeding users...");
    let hash = hash_password(&password).context("Failed to hash seed password")?;
    seed_user(&db, "superadmin", "Super Admin", Role::SuperAdmin, &hash).await?;
    seed_user(&db, "siteadmin", "Site Admin", Role::SiteAdmin, &hash).await?;
    let supervisor = seed_user(&db, "supervisor", "Site Supervisor", Role::Supervisor, &hash).await?;

    println!("Seeding site and worker types...");
    seed_site(&db, supervisor).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    full_name: &str,
    role: Role,
    password_hash: &str,
) -> anyhow::Result<Uuid> {
    let repo = UserRepository::new(db.clone());
    if let Some(existing) = repo.find_by_login(username).await? {
        println!("  {username} already exists");
        return Ok(existing.id);
    }

    let user = repo
        .create(CreateUserInput {
            username: username.to_string(),
            email: format!("{username}@sitebook.local"),
            full_name: full_name.to_string(),
            password_hash: password_hash.to_string(),
            role,
        })
        .await?;
    println!("  created {username} ({role})");
    Ok(user.id)
}

async fn seed_site(db: &DatabaseConnection, supervisor_id: Uuid) -> anyhow::Result<()> {
    let sites = SiteRepository::new(db.clone());
    if sites.find_by_code("DEMO-01").await?.is_some() {
        println!("  site DEMO-01 already exists");
        return Ok(());
    }

    let site = sites
        .create(CreateSiteInput {
            name: "Demo Quarry".to_string(),
            code: "DEMO-01".to_string(),
            location: Some("North ridge".to_string()),
            supervisor_id: Some(supervisor_id),
        })
        .await?;

    let worker_types = WorkerTypeRepository::new(db.clone());
    for (name, rate) in WORKER_TYPES {
        worker_types.create(site.id, name, Decimal::from(rate)).await?;
    }
    println!("  created site DEMO-01 with {} worker types", WORKER_TYPES.len());
    Ok(())
}
