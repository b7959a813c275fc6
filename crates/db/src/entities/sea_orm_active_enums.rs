//! Enum columns shared by several entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use sitebook_core::access::Role;
use sitebook_core::audit::AuditAction as CoreAuditAction;

/// `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "site_admin")]
    SiteAdmin,
    #[sea_orm(string_value = "supervisor")]
    Supervisor,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::SuperAdmin => Self::SuperAdmin,
            UserRole::SiteAdmin => Self::SiteAdmin,
            UserRole::Supervisor => Self::Supervisor,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::SuperAdmin => Self::SuperAdmin,
            Role::SiteAdmin => Self::SiteAdmin,
            Role::Supervisor => Self::Supervisor,
        }
    }
}

/// `audit_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    #[sea_orm(string_value = "create")]
    Create,
    #[sea_orm(string_value = "update")]
    Update,
    #[sea_orm(string_value = "delete")]
    Delete,
    #[sea_orm(string_value = "login")]
    Login,
    #[sea_orm(string_value = "logout")]
    Logout,
    #[sea_orm(string_value = "lock")]
    Lock,
    #[sea_orm(string_value = "correction")]
    Correction,
    #[sea_orm(string_value = "invoice_generate")]
    InvoiceGenerate,
    #[sea_orm(string_value = "export")]
    Export,
    #[sea_orm(string_value = "print")]
    Print,
}

impl From<CoreAuditAction> for AuditAction {
    fn from(action: CoreAuditAction) -> Self {
        match action {
            CoreAuditAction::Create => Self::Create,
            CoreAuditAction::Update => Self::Update,
            CoreAuditAction::Delete => Self::Delete,
            CoreAuditAction::Login => Self::Login,
            CoreAuditAction::Logout => Self::Logout,
            CoreAuditAction::Lock => Self::Lock,
            CoreAuditAction::Correction => Self::Correction,
            CoreAuditAction::InvoiceGenerate => Self::InvoiceGenerate,
            CoreAuditAction::Export => Self::Export,
            CoreAuditAction::Print => Self::Print,
        }
    }
}

impl From<AuditAction> for CoreAuditAction {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Create => Self::Create,
            AuditAction::Update => Self::Update,
            AuditAction::Delete => Self::Delete,
            AuditAction::Login => Self::Login,
            AuditAction::Logout => Self::Logout,
            AuditAction::Lock => Self::Lock,
            AuditAction::Correction => Self::Correction,
            AuditAction::InvoiceGenerate => Self::InvoiceGenerate,
            AuditAction::Export => Self::Export,
            AuditAction::Print => Self::Print,
        }
    }
}
