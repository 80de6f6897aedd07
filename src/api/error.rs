use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use crate::services::auth_service::AuthError;
use crate::services::tag_service::TagError;
use crate::services::token::TokenError;

pub const MSG_MISSING_API_KEY: &str = "Oops, you need to provide an API key";
pub const MSG_INVALID_API_KEY: &str = "Oops, your API key is invalid";
pub const MSG_UNAUTHORIZED: &str = "Oops, you're not authorized to access this resource";
pub const MSG_FORBIDDEN: &str = "Oops, you don't have permission to access this resource";
pub const MSG_BAD_CREDENTIALS: &str = "Oops, your email or password doesn't match our records";
pub const MSG_EMAIL_TAKEN: &str = "Oops, the email you filled in already exists";
pub const MSG_INVALID_TOKEN: &str =
    "Oops, your token is invalid. Please refresh your token or sign in again";
pub const MSG_TAG_NOT_FOUND: &str = "Oops, tag not found";

/// Failure envelope: `errors` is either a single message string or a
/// field-name to message map for validation failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub status_code: u16,
    pub errors: Value,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(Value),

    BadRequest(String),

    Unauthorized(String),

    Forbidden,

    NotFound(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!(msg)),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!(MSG_FORBIDDEN)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("Oops, something went wrong on our side"),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("Oops, something went wrong on our side"),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            status_code: status.as_u16(),
            errors,
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::BadRequest(MSG_BAD_CREDENTIALS.to_string()),
            AuthError::EmailTaken => ApiError::BadRequest(MSG_EMAIL_TAKEN.to_string()),
            AuthError::InvalidToken => ApiError::Unauthorized(MSG_INVALID_TOKEN.to_string()),
            AuthError::UserNotFound => ApiError::NotFound("Oops, user not found".to_string()),
            AuthError::Validation(msg) => ApiError::Validation(json!(msg)),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => ApiError::Unauthorized(MSG_INVALID_TOKEN.to_string()),
            TokenError::Database(msg) => ApiError::DatabaseError(msg),
            TokenError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<TagError> for ApiError {
    fn from(err: TagError) -> Self {
        match err {
            TagError::NotFound => ApiError::BadRequest(MSG_TAG_NOT_FOUND.to_string()),
            TagError::Validation(msg) => ApiError::Validation(json!(msg)),
            TagError::Database(msg) => ApiError::DatabaseError(msg),
            TagError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}
