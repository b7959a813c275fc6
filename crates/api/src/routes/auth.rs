//! Authentication routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tracing::{error, info};

use crate::{AppState, error::ApiError, middleware::ClientInfo};
use sitebook_core::access::Role;
use sitebook_core::audit::{AuditAction, AuditEntry};
use sitebook_core::auth::verify_password;
use sitebook_shared::auth::{LoginRequest, LoginResponse, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

fn invalid_credentials() -> ApiError {
    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "Invalid username or password",
    )
}

fn internal() -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An error occurred during login",
    )
}

/// POST /auth/login - Authenticate by username or email and return a token.
async fn login(
    State(state): State<AppState>,
    ClientInfo(ctx): ClientInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let login = payload.login.trim();
    if login.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("login and password are required"));
    }

    let user = match state.users().find_by_login(login).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(login = %login, "Login attempt for non-existent user");
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return Err(internal());
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return Err(internal());
        }
    }

    if !user.is_active {
        info!(user_id = %user.id, "Login attempt for inactive user");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "inactive_user",
            "This account has been deactivated",
        ));
    }

    let role = Role::from(user.role);
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, role.as_str())
        .map_err(|e| {
            error!(error = %e, "Failed to generate access token");
            internal()
        })?;

    state
        .audit()
        .log(
            AuditEntry::new(AuditAction::Login, "users")
                .actor(Some(user.id))
                .record(user.id)
                .description(format!("User {} logged in", user.username))
                .context(&ctx)
                .at(state.clock.now()),
        )
        .await?;

    info!(user_id = %user.id, "User logged in successfully");

    let response = LoginResponse {
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: role.as_str().to_string(),
        },
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    Ok((StatusCode::OK, Json(response)))
}
