//! HTTP error type shared by all handlers.
//!
//! Every failure leaves the server as `{"error": "<message>"}` with the status
//! picked here. Internal details are logged, never returned.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tictactoe::{AuthError, GameError};

/// Application-level error type for HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Missing or rejected credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Valid request, refused (bad refresh token)
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with game state (occupied cell, game over, off-board)
    #[error("{0}")]
    Conflict(String),

    /// The move oracle failed; its message is passed through
    #[error("{0}")]
    Upstream(String),

    /// Anything the client cannot act on
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "Internal server error".to_string()
            }
            ApiError::Upstream(message) => {
                tracing::error!(error = %message, "Move oracle failure");
                message
            }
            ApiError::Validation(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Store(_) => ApiError::Internal(err.to_string()),
            GameError::Oracle(_) | GameError::NoMoveAvailable => {
                ApiError::Upstream(err.client_message())
            }
            GameError::SessionNotFound | GameError::UserNotFound => {
                ApiError::NotFound(err.client_message())
            }
            GameError::GameAlreadyOver(_)
            | GameError::CellOccupied { .. }
            | GameError::InvalidPosition { .. } => ApiError::Conflict(err.client_message()),
        }
    }
}

/// Map an auth failure, sending every non-internal error to `client_error`
///
/// Each auth route answers its own domain failures with a single status.
pub fn auth_error(err: AuthError, client_error: fn(String) -> ApiError) -> ApiError {
    if err.is_internal() {
        ApiError::Internal(err.to_string())
    } else {
        client_error(err.client_message())
    }
}
