//! Daily record ledger.
//!
//! A record is opened for one site and date, edited freely while unlocked,
//! locked once its date has passed (or by an admin), and afterwards only
//! changed through a reasoned correction by an admin.
//!
//! # Modules
//!
//! - `types` - Record fields, patches, lifecycle state and audit snapshots
//! - `error` - Ledger error taxonomy
//! - `payroll` - Item validation and per-worker payment derivation
//! - `service` - Lifecycle decisions (open, update, correct, lock)

pub mod error;
pub mod payroll;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use payroll::{PayrollTotals, derive_item, validate_items};
pub use service::DailyRecordService;
pub use types::{
    DEFAULT_PRODUCTION_UNIT, DerivedItem, ItemInput, LockPlan, RecordFields, RecordPatch,
    RecordSnapshot, RecordState, TABLE_NAME, UpdatePlan,
};
