//! Shared types, errors, and configuration for Sitebook.
//!
//! This crate provides common types used across all other crates:
//! - Application configuration (explicitly constructed, never global)
//! - Application-wide error types
//! - JWT claims and token service
//! - Pagination types for list endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;


pub use auth::Claims;
pub use config::{AppConfig, LedgerConfig, LockMode};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
