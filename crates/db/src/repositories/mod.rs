//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod audit;
pub mod daily_record;
pub mod site;
pub mod user;
pub mod worker_type;

pub use audit::{
    ActionCount, ActivityDay, AuditError, AuditRepository, AuditStatistics, AuditTotals,
    CorrectionStat, TableCount, UserActivity,
};
pub use daily_record::{
    DailyActivity, DailyRecordRepository, DailyRecordWithItems, DailySummary, MissingSite,
    OpenRecordInput, RECENT_ACTIVITY_DAYS,
};
pub use site::{CreateSiteInput, SiteRepository};
pub use user::{CreateUserInput, UserRepository};
pub use worker_type::WorkerTypeRepository;
