//! Core business logic for Sitebook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `access` - Role-based access policy
//! - `audit` - Audit trail entry model
//! - `auth` - Password hashing
//! - `clock` - Injectable notion of "now" and "today"
//! - `daily_record` - Daily record lifecycle (open, update, correct, lock) and payroll math

pub mod access;
pub mod audit;
pub mod auth;
pub mod clock;
pub mod daily_record;
