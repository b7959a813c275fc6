//! Audit trail entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A row was created.
    Create,
    /// An unlocked row was modified.
    Update,
    /// A row was deleted.
    Delete,
    /// A user signed in.
    Login,
    /// A user signed out.
    Logout,
    /// A daily record was locked.
    Lock,
    /// A locked daily record was corrected.
    Correction,
    /// An invoice was generated.
    InvoiceGenerate,
    /// Data was exported.
    Export,
    /// A document was printed.
    Print,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Lock => "lock",
            Self::Correction => "correction",
            Self::InvoiceGenerate => "invoice_generate",
            Self::Export => "export",
            Self::Print => "print",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "lock" => Some(Self::Lock),
            "correction" => Some(Self::Correction),
            "invoice_generate" => Some(Self::InvoiceGenerate),
            "export" => Some(Self::Export),
            "print" => Some(Self::Print),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audited action, ready to be persisted.
///
/// Built with the chained setters:
///
/// ```
/// use sitebook_core::audit::{AuditAction, AuditEntry};
/// use uuid::Uuid;
///
/// let entry = AuditEntry::new(AuditAction::Lock, "daily_records")
///     .record(Uuid::nil())
///     .description("Locked daily record");
/// assert!(entry.actor_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// Acting user; `None` for system actions.
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub action: AuditAction,
    /// Affected table.
    pub table_name: String,
    /// Affected row.
    pub record_id: Option<Uuid>,
    /// Snapshot before the action.
    pub old_values: Option<Value>,
    /// Snapshot after the action.
    pub new_values: Option<Value>,
    /// Human-readable summary.
    pub description: Option<String>,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Reason given for a correction.
    pub correction_reason: Option<String>,
    /// Correction sequence number after a correction.
    pub correction_count: Option<i32>,
    /// When the action happened; the store's clock if unset.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    /// Starts an entry for a system action on `table_name`.
    #[must_use]
    pub fn new(action: AuditAction, table_name: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            action,
            table_name: table_name.into(),
            record_id: None,
            old_values: None,
            new_values: None,
            description: None,
            ip_address: None,
            user_agent: None,
            correction_reason: None,
            correction_count: None,
            occurred_at: None,
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub fn actor(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// Sets the affected row.
    #[must_use]
    pub fn record(mut self, record_id: Uuid) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Sets before/after snapshots.
    #[must_use]
    pub fn values(mut self, old_values: Option<Value>, new_values: Option<Value>) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets request context.
    #[must_use]
    pub fn request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Sets the time the action happened.
    #[must_use]
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Sets correction metadata.
    #[must_use]
    pub fn correction(mut self, reason: impl Into<String>, sequence: i32) -> Self {
        self.correction_reason = Some(reason.into());
        self.correction_count = Some(sequence);
        self
    }
}

/// Returns the top-level keys whose values differ between two JSON objects.
///
/// Keys present on only one side count as changed. Non-object inputs yield
/// an empty list.
#[must_use]
pub fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    let (Some(old), Some(new)) = (old.as_object(), new.as_object()) else {
        return Vec::new();
    };

    let mut keys: Vec<String> = old
        .keys()
        .chain(new.keys().filter(|k| !old.contains_key(*k)))
        .filter(|k| old.get(*k) != new.get(*k))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
