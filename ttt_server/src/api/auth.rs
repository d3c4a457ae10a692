//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for user authentication including:
//! - Registration with email and password
//! - Login returning an access/refresh token pair
//! - Refresh-token rotation
//! - Logout to revoke the stored refresh token
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "alice@example.com", "password": "pw123"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "alice@example.com", "password": "pw123"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tictactoe::auth::{User, UserId};

use super::{
    AppState,
    error::{ApiError, ApiResult, auth_error},
    middleware::AuthenticatedUser,
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct CredentialsPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new user account.
///
/// # Request Body
///
/// ```json
/// { "email": "alice@example.com", "password": "pw123" }
/// ```
///
/// # Response
///
/// `201 Created`:
/// ```json
/// { "message": "User registered successfully", "user": { "id": 1, "email": "alice@example.com" } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Email taken (in any casing), malformed email, or empty password
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(payload) = payload?;

    let user = state
        .auth_manager
        .register(&payload.email, &payload.password)
        .await
        .map_err(|e| auth_error(e, ApiError::Validation))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

/// Authenticate a user and issue session tokens.
///
/// Access tokens live 5 minutes, refresh tokens 7 days by default. Logging in
/// supersedes any refresh token issued earlier.
///
/// # Response
///
/// `200 OK`:
/// ```json
/// {
///   "message": "Login successful",
///   "user": { "id": 1, "email": "alice@example.com" },
///   "accessToken": "eyJhbGciOiJIUzI1NiIs...",
///   "refreshToken": "eyJhbGciOiJIUzI1NiIs..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsPayload>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(payload) = payload.map_err(|e| ApiError::Unauthorized(e.body_text()))?;

    match state
        .auth_manager
        .login(&payload.email, &payload.password)
        .await
    {
        Ok((user, tokens)) => {
            metrics::login_attempts_total(true);
            Ok(Json(LoginResponse {
                message: "Login successful".to_string(),
                user: user.into(),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            }))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if !e.is_internal() {
                log_security_event(
                    "failed_login",
                    None,
                    &format!("Login rejected for {}", payload.email.trim()),
                );
            }
            Err(auth_error(e, ApiError::Unauthorized))
        }
    }
}

/// Rotate a refresh token.
///
/// The presented token must be the one most recently issued to the user; it
/// is replaced and stops working.
///
/// # Request Body
///
/// ```json
/// { "refreshToken": "eyJhbGciOiJIUzI1NiIs..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: No refresh token supplied
/// - `403 Forbidden`: Invalid, expired, superseded or revoked refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshPayload>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let token = payload
        .ok()
        .and_then(|Json(payload)| payload.refresh_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Validation("Refresh token required".to_string()))?;

    let tokens = state.auth_manager.refresh(&token).await.map_err(|e| {
        if !e.is_internal() {
            log_security_event("refresh_rejected", None, "Refresh token rejected");
        }
        auth_error(e, ApiError::Forbidden)
    })?;

    Ok(Json(RefreshResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Logout and revoke the stored refresh token.
///
/// The access token keeps working until it expires naturally.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .auth_manager
        .logout(user.id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    log_security_event(
        "logout",
        Some(user.id),
        &format!("Refresh token revoked for {}", user.email),
    );
    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}
