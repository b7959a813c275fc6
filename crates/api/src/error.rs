//! Error rendering for handlers.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`
//! with the status the domain error reports.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

use sitebook_core::access::AccessError;
use sitebook_core::daily_record::LedgerError;
use sitebook_db::repositories::AuditError;
use sitebook_shared::AppError;

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with a `validation_error` code.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        Self::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message
            })),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = match &err {
            LedgerError::StorageUnavailable(_) => "Storage is temporarily unavailable".to_string(),
            other => other.to_string(),
        };
        Self::from_parts(err.status_code(), err.error_code(), message)
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        let message = match &err {
            AuditError::StorageUnavailable(_) => "Storage is temporarily unavailable".to_string(),
            AuditError::Denied(denied) => denied.to_string(),
        };
        Self::from_parts(err.status_code(), err.error_code(), message)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let message = match &err {
            AppError::Database(_) | AppError::Internal(_) | AppError::Configuration(_) => {
                "An error occurred".to_string()
            }
            other => other.to_string(),
        };
        Self::from_parts(err.status_code(), err.error_code(), message)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::validation(err.to_string())
    }
}
