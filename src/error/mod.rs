//! Application error types and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned for every rejected refresh token, whatever the reason.
pub const INVALID_TOKEN_MESSAGE: &str = "Token is invalid or expired";

/// Message returned for every failed logout.
pub const LOGOUT_FAILED_MESSAGE: &str = "Unable to log out with the given token";

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Username or email already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or missing/invalid access token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Refresh token expired, malformed or revoked. The reason is internal only.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Generic failure for the logout path.
    #[error("Bad request")]
    BadRequest,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Redis(e) => {
                tracing::error!(error = %e, "redis error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Token store unavailable".to_string(),
                )
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE.to_string())
            }
            AppError::BadRequest => (StatusCode::BAD_REQUEST, LOGOUT_FAILED_MESSAGE.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
