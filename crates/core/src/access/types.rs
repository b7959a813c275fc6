//! Access control domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// User role, ordered from lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Records daily production for the sites they supervise.
    Supervisor = 0,
    /// Administers sites, records and supervisors.
    SiteAdmin = 1,
    /// Full access, including managing other admins.
    SuperAdmin = 2,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "supervisor" => Some(Self::Supervisor),
            "site_admin" => Some(Self::SiteAdmin),
            "super_admin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::SiteAdmin => "site_admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Returns true for `site_admin` and `super_admin`.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::SiteAdmin | Self::SuperAdmin)
    }

    /// Returns true for `super_admin` only.
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user an operation is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User id.
    pub user_id: Uuid,
    /// Current role.
    pub role: Role,
    /// Whether the account is active.
    pub is_active: bool,
}

impl Actor {
    /// Creates an active actor.
    #[must_use]
    pub const fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            is_active: true,
        }
    }

    /// Returns true if the actor holds an admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Something an actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// View a resource.
    Read,
    /// Create a resource.
    Create,
    /// Modify an unlocked resource.
    Update,
    /// Lock a daily record.
    Lock,
    /// Modify a locked daily record.
    Correct,
    /// Remove a resource.
    Delete,
    /// Create or modify non-admin users.
    ManageUsers,
    /// Create a user with an admin role.
    CreateAdmin,
    /// Remove a user account.
    DeleteUser,
    /// Query the audit trail.
    ReadAudit,
    /// Trigger maintenance jobs such as auto-locking.
    RunMaintenance,
}

impl Action {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Lock => "lock",
            Self::Correct => "correct",
            Self::Delete => "delete",
            Self::ManageUsers => "manage_users",
            Self::CreateAdmin => "create_admin",
            Self::DeleteUser => "delete_user",
            Self::ReadAudit => "read_audit",
            Self::RunMaintenance => "run_maintenance",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a profile change that only privileged actors may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileChange {
    /// New role, if the change assigns one.
    pub role: Option<Role>,
    /// New active flag, if the change sets one.
    pub active: Option<bool>,
}

impl ProfileChange {
    /// Returns true if the change touches role or active flag.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.role.is_some() || self.active.is_some()
    }
}

/// The thing an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// A site, with its assigned supervisor.
    Site {
        /// Supervisor assigned to the site.
        supervisor_id: Option<Uuid>,
    },
    /// A daily record, scoped by its site's supervisor.
    DailyRecord {
        /// Supervisor assigned to the record's site.
        site_supervisor_id: Option<Uuid>,
    },
    /// A user profile.
    UserProfile {
        /// Owner of the profile.
        user_id: Uuid,
        /// Privileged fields the request changes.
        change: ProfileChange,
    },
    /// The audit trail.
    AuditLog,
    /// System-wide maintenance.
    System,
}

/// Why an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The actor's account is deactivated.
    InactiveActor,
    /// The actor does not supervise the target site.
    NotAssignedToSite,
    /// The action needs `site_admin` or `super_admin`.
    RequiresAdmin,
    /// The action needs `super_admin`.
    RequiresSuperAdmin,
    /// A non-admin tried to change a role or active flag.
    RoleEscalation,
    /// The profile belongs to someone else.
    NotOwner,
}

impl DenyReason {
    /// Returns true if the denial is about role level rather than scope.
    #[must_use]
    pub const fn is_privilege(&self) -> bool {
        matches!(self, Self::RequiresAdmin | Self::RequiresSuperAdmin)
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InactiveActor => "user account is inactive",
            Self::NotAssignedToSite => "user is not assigned to this site",
            Self::RequiresAdmin => "admin role required",
            Self::RequiresSuperAdmin => "super admin role required",
            Self::RoleEscalation => "only admins may change role or active status",
            Self::NotOwner => "profile belongs to another user",
        };
        f.write_str(msg)
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action is permitted.
    Allow,
    /// The action is denied.
    Deny(DenyReason),
}

impl Decision {
    /// Returns true if the decision is `Allow`.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a `Result` for `?` propagation.
    pub fn require(self, action: Action) -> Result<(), AccessError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(AccessError::Denied { action, reason }),
        }
    }
}

/// Access denial as an error.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    /// The policy denied the action.
    #[error("{action} denied: {reason}")]
    Denied {
        /// The attempted action.
        action: Action,
        /// Why it was denied.
        reason: DenyReason,
    },
}

impl AccessError {
    /// Returns the deny reason.
    #[must_use]
    pub const fn reason(&self) -> DenyReason {
        match self {
            Self::Denied { reason, .. } => *reason,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        403
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        if self.reason().is_privilege() {
            "insufficient_privilege"
        } else {
            "authorization_error"
        }
    }
}
