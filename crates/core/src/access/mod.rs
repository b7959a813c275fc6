//! Role-based access control.
//!
//! `AccessPolicy::evaluate` is a pure function of actor, action and resource.
//! Every ledger operation and every audit read goes through it.

pub mod policy;
pub mod types;

#[cfg(test)]
mod policy_props;

pub use policy::AccessPolicy;
pub use types::{AccessError, Action, Actor, Decision, DenyReason, ProfileChange, Resource, Role};
