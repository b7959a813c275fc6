//! Daily record ledger error types.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::access::AccessError;

/// Errors that can occur during daily record operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record already exists for the site and date.
    #[error("A daily record already exists for site {site_id} on {record_date}")]
    DuplicateRecord {
        /// The site.
        site_id: Uuid,
        /// The record date.
        record_date: NaiveDate,
    },

    /// The actor may not act on this site or record.
    #[error("Not authorized: {0}")]
    AuthorizationError(String),

    /// The action needs a higher role.
    #[error("Insufficient privilege: {0}")]
    InsufficientPrivilege(String),

    /// A line item is malformed.
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// A locked record was modified without a correction reason.
    #[error("Record is locked; a correction reason is required")]
    LockedWithoutReason,

    /// The record changed since it was read.
    #[error("Daily record {0} was modified concurrently")]
    Conflict(Uuid),

    /// The store could not be reached or rejected the write.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Daily record not found.
    #[error("Daily record {0} not found")]
    NotFound(Uuid),

    /// Site not found.
    #[error("Site {0} not found")]
    SiteNotFound(Uuid),

    /// Records cannot be opened for future dates.
    #[error("Record date {0} is in the future")]
    FutureDate(NaiveDate),

    /// The record has used up its corrections.
    #[error("Correction limit of {limit} reached")]
    CorrectionLimitReached {
        /// Configured maximum.
        limit: i32,
    },
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidItem(_) | Self::LockedWithoutReason | Self::FutureDate(_) => 400,

            Self::AuthorizationError(_) | Self::InsufficientPrivilege(_) => 403,

            Self::NotFound(_) | Self::SiteNotFound(_) => 404,

            Self::DuplicateRecord { .. } | Self::Conflict(_) => 409,

            Self::CorrectionLimitReached { .. } => 422,

            Self::StorageUnavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateRecord { .. } => "duplicate_record",
            Self::AuthorizationError(_) => "authorization_error",
            Self::InsufficientPrivilege(_) => "insufficient_privilege",
            Self::InvalidItem(_) => "invalid_item",
            Self::LockedWithoutReason => "locked_without_reason",
            Self::Conflict(_) => "conflict",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::NotFound(_) => "not_found",
            Self::SiteNotFound(_) => "site_not_found",
            Self::FutureDate(_) => "future_date",
            Self::CorrectionLimitReached { .. } => "correction_limit_reached",
        }
    }
}

impl From<AccessError> for LedgerError {
    fn from(err: AccessError) -> Self {
        if err.reason().is_privilege() {
            Self::InsufficientPrivilege(err.to_string())
        } else {
            Self::AuthorizationError(err.to_string())
        }
    }
}
