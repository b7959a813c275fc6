//! Append-only audit trail model.
//!
//! Entries are built here and persisted by the database layer, always on the
//! same transaction as the change they describe.

pub mod types;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use types::{AuditAction, AuditEntry, changed_fields};

/// Client details attached to audit entries written during a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

impl AuditEntry {
    /// Attaches request context.
    #[must_use]
    pub fn context(self, ctx: &RequestContext) -> Self {
        self.request(ctx.ip_address.clone(), ctx.user_agent.clone())
    }
}

/// Criteria for listing audit entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Affected table.
    pub table_name: Option<String>,
    /// Acting user.
    pub user_id: Option<Uuid>,
    /// Action kind.
    pub action: Option<AuditAction>,
    /// Affected row.
    pub record_id: Option<Uuid>,
    /// Inclusive lower bound on creation time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time.
    pub to: Option<DateTime<Utc>>,
}
