//! `SeaORM` entity definitions.

pub mod prelude;

pub mod audit_logs;
pub mod daily_record_items;
pub mod daily_records;
pub mod sea_orm_active_enums;
pub mod sites;
pub mod users;
pub mod worker_types;
