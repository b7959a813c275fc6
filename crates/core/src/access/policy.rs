//! Role-based access policy.
//!
//! Deny is the default. Every `Allow` below comes from an explicit rule.

use uuid::Uuid;

use crate::access::types::{Action, Actor, Decision, DenyReason, Resource};

/// Stateless access policy evaluator.
pub struct AccessPolicy;

impl AccessPolicy {
    /// Decide whether `actor` may perform `action` on `resource`.
    ///
    /// Rules, in order:
    /// 1. Inactive actors are denied everything.
    /// 2. `CreateAdmin` and `DeleteUser` need `super_admin`, as does assigning
    ///    an admin role through a profile change.
    /// 3. Profiles: admins may do anything else; owners may read and update
    ///    their own profile as long as role and active flag stay untouched.
    /// 4. Admins may do anything else.
    /// 5. Supervisors may read, create and update within sites they supervise.
    #[must_use]
    pub fn evaluate(actor: &Actor, action: Action, resource: &Resource) -> Decision {
        if !actor.is_active {
            return Decision::Deny(DenyReason::InactiveActor);
        }

        if matches!(action, Action::CreateAdmin | Action::DeleteUser) {
            return Self::require_super_admin(actor);
        }

        if let Resource::UserProfile { user_id, change } = resource {
            if change.role.is_some_and(|role| role.is_admin()) {
                return Self::require_super_admin(actor);
            }
            if actor.is_admin() {
                return Decision::Allow;
            }
            return Self::evaluate_own_profile(actor, action, *user_id, change.is_privileged());
        }

        if actor.is_admin() {
            return Decision::Allow;
        }

        Self::evaluate_supervisor(actor, action, resource)
    }

    /// Shorthand for `evaluate(..).is_allowed()`.
    #[must_use]
    pub fn is_allowed(actor: &Actor, action: Action, resource: &Resource) -> bool {
        Self::evaluate(actor, action, resource).is_allowed()
    }

    fn require_super_admin(actor: &Actor) -> Decision {
        if actor.role.is_super_admin() {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::RequiresSuperAdmin)
        }
    }

    fn evaluate_own_profile(
        actor: &Actor,
        action: Action,
        owner: Uuid,
        privileged_change: bool,
    ) -> Decision {
        match action {
            Action::Read | Action::Update if actor.user_id == owner => {
                if privileged_change {
                    Decision::Deny(DenyReason::RoleEscalation)
                } else {
                    Decision::Allow
                }
            }
            Action::Read | Action::Update => Decision::Deny(DenyReason::NotOwner),
            _ => Decision::Deny(DenyReason::RequiresAdmin),
        }
    }

    fn evaluate_supervisor(actor: &Actor, action: Action, resource: &Resource) -> Decision {
        let site_supervisor = match resource {
            Resource::Site { supervisor_id } => *supervisor_id,
            Resource::DailyRecord { site_supervisor_id } => *site_supervisor_id,
            Resource::AuditLog | Resource::System | Resource::UserProfile { .. } => {
                return Decision::Deny(DenyReason::RequiresAdmin);
            }
        };

        match action {
            Action::Read | Action::Create | Action::Update => {
                if site_supervisor == Some(actor.user_id) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotAssignedToSite)
                }
            }
            _ => Decision::Deny(DenyReason::RequiresAdmin),
        }
    }
}
