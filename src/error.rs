//! Unified error handling for the authentication core.
//!
//! Every operation surfaces one of these kinds; the HTTP layer maps them
//! onto status codes and the kind alone determines what a caller sees.
//! Credential material (passwords, token strings) never appears in error
//! messages or log records.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone)]
pub enum AuthError {
    /// Input rejected before any mutation was attempted.
    Validation { field: &'static str, reason: String },
    /// Unknown email or wrong password. Deliberately indistinguishable.
    InvalidCredentials,
    /// Token missing, expired, or already consumed.
    TokenInvalid,
    /// Duplicate email.
    Conflict(String),
    NotFound(String),
    /// The requested transition already happened (e.g. already verified).
    AlreadyInDesiredState(String),
    /// Storage or hashing failure, or broken server state such as a
    /// missing default account type. Detail is logged, not returned.
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            reason: reason.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::Validation { .. } => "VALIDATION_ERROR",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::Conflict(_) => "CONFLICT",
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::AlreadyInDesiredState(_) => "ALREADY_IN_DESIRED_STATE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Validation { field, reason } => write!(f, "{} {}", field, reason),
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::TokenInvalid => write!(f, "invalid token"),
            AuthError::Conflict(msg) => write!(f, "{}", msg),
            AuthError::NotFound(msg) => write!(f, "{}", msg),
            AuthError::AlreadyInDesiredState(msg) => write!(f, "{}", msg),
            AuthError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AuthError {}

/// Storage failures are wrapped as `Internal` without leaking driver
/// detail to the caller. Unique violations are handled at the call sites
/// that can name the conflicting field; anything reaching this conversion
/// is unexpected.
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Internal(format!("database error: {}", err))
    }
}

/// True when the error is a Postgres unique-constraint violation
/// (SQLSTATE 23505). Used for duplicate-email detection and for the
/// token issuer's regenerate-and-retry loop.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let message = match self {
            // Internal detail goes to the log only.
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal server error".to_string()
            }
            other => {
                tracing::warn!(code = other.code(), error = %other, "request failed");
                other.to_string()
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            code: self.code().to_string(),
            message,
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation { .. } => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::AlreadyInDesiredState(_) => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
