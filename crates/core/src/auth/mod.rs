//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//!
//! Roles live in [`crate::access`].

mod password;

pub use password::{PasswordError, hash_password, verify_password};
