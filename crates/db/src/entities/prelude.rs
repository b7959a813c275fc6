//! Entity re-exports.

pub use super::audit_logs::Entity as AuditLogs;
pub use super::daily_record_items::Entity as DailyRecordItems;
pub use super::daily_records::Entity as DailyRecords;
pub use super::sites::Entity as Sites;
pub use super::users::Entity as Users;
pub use super::worker_types::Entity as WorkerTypes;
