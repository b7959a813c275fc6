//! Property-based tests for AccessPolicy.

use proptest::prelude::*;
use uuid::Uuid;

use crate::access::policy::AccessPolicy;
use crate::access::types::{Action, Actor, Decision, DenyReason, ProfileChange, Resource, Role};

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Supervisor),
        Just(Role::SiteAdmin),
        Just(Role::SuperAdmin),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Read),
        Just(Action::Create),
        Just(Action::Update),
        Just(Action::Lock),
        Just(Action::Correct),
        Just(Action::Delete),
        Just(Action::ManageUsers),
        Just(Action::CreateAdmin),
        Just(Action::DeleteUser),
        Just(Action::ReadAudit),
        Just(Action::RunMaintenance),
    ]
}

fn arb_resource() -> impl Strategy<Value = Resource> {
    prop_oneof![
        proptest::option::of(arb_uuid()).prop_map(|supervisor_id| Resource::Site { supervisor_id }),
        proptest::option::of(arb_uuid())
            .prop_map(|site_supervisor_id| Resource::DailyRecord { site_supervisor_id }),
        (
            arb_uuid(),
            proptest::option::of(arb_role()),
            proptest::option::of(any::<bool>())
        )
            .prop_map(|(user_id, role, active)| Resource::UserProfile {
                user_id,
                change: ProfileChange { role, active },
            }),
        Just(Resource::AuditLog),
        Just(Resource::System),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Inactive actors are denied every action on every resource.
    #[test]
    fn prop_inactive_actor_always_denied(
        user_id in arb_uuid(),
        role in arb_role(),
        action in arb_action(),
        resource in arb_resource(),
    ) {
        let actor = Actor { user_id, role, is_active: false };
        prop_assert_eq!(
            AccessPolicy::evaluate(&actor, action, &resource),
            Decision::Deny(DenyReason::InactiveActor)
        );
    }

    /// Supervisors never lock or correct, even on their own site.
    #[test]
    fn prop_supervisor_never_locks_or_corrects(
        user_id in arb_uuid(),
        correct in any::<bool>(),
    ) {
        let actor = Actor::new(user_id, Role::Supervisor);
        let action = if correct { Action::Correct } else { Action::Lock };
        let resource = Resource::DailyRecord { site_supervisor_id: Some(user_id) };
        prop_assert!(!AccessPolicy::is_allowed(&actor, action, &resource));
    }

    /// Super admins are allowed everything while active.
    #[test]
    fn prop_super_admin_allowed_everything(
        user_id in arb_uuid(),
        action in arb_action(),
        resource in arb_resource(),
    ) {
        let actor = Actor::new(user_id, Role::SuperAdmin);
        prop_assert_eq!(AccessPolicy::evaluate(&actor, action, &resource), Decision::Allow);
    }

    /// Only super admins may create admins or delete users.
    #[test]
    fn prop_admin_creation_requires_super_admin(
        user_id in arb_uuid(),
        role in arb_role(),
        delete in any::<bool>(),
        resource in arb_resource(),
    ) {
        let actor = Actor::new(user_id, role);
        let action = if delete { Action::DeleteUser } else { Action::CreateAdmin };
        let allowed = AccessPolicy::is_allowed(&actor, action, &resource);
        prop_assert_eq!(allowed, role == Role::SuperAdmin);
    }

    /// A supervisor's scoped access depends only on site assignment.
    #[test]
    fn prop_supervisor_scope_follows_assignment(
        user_id in arb_uuid(),
        other in arb_uuid(),
        assigned in any::<bool>(),
    ) {
        prop_assume!(user_id != other);
        let actor = Actor::new(user_id, Role::Supervisor);
        let supervisor = if assigned { user_id } else { other };
        let resource = Resource::Site { supervisor_id: Some(supervisor) };
        for action in [Action::Read, Action::Create, Action::Update] {
            prop_assert_eq!(AccessPolicy::is_allowed(&actor, action, &resource), assigned);
        }
    }
}
