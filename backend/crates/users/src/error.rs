//! Users Error Types
//!
//! Users-specific error variants that integrate with the unified
//! `kernel::error::AppError` system. The `Display` text of each client-facing
//! variant is the `detail` sent in the response body.

use std::borrow::Cow;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::mail::MailError;
use thiserror::Error;

/// Users-specific result type alias
pub type UsersResult<T> = Result<T, UsersError>;

/// Detail sent when an inactive account tries to log in
pub const ACCOUNT_NOT_VERIFIED_DETAIL: &str =
    "Your account is not verified. A verification email has been sent to your inbox.";

#[derive(Debug, Error)]
pub enum UsersError {
    /// Field-level validation failure
    #[error("{message}")]
    Validation {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    /// Request body is not valid JSON for the endpoint
    #[error("JSON parse error - {0}")]
    MalformedBody(String),

    /// Email already registered
    #[error("user with this email address already exists.")]
    EmailTaken,

    /// Wrong email/password, or the account cannot log in
    #[error("No active account found with the given credentials")]
    InvalidCredentials,

    /// Login attempt on an account that was never activated
    #[error("{}", ACCOUNT_NOT_VERIFIED_DETAIL)]
    AccountNotVerified,

    /// Bearer token missing
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// JWT failed signature, expiry or type checks
    #[error("Token is invalid or expired")]
    InvalidToken,

    /// Valid token whose user is gone or inactive
    #[error("No active account found for the given token.")]
    TokenUserInactive,

    /// uid in an activation/reset link does not decode to a user
    #[error("Invalid user id or user doesn't exist.")]
    InvalidUid,

    /// Account token does not match the user or has expired
    #[error("Invalid token for given user.")]
    InvalidAccountToken,

    /// Activation link used on an account that is already active
    #[error("Stale token for given user.")]
    StaleToken,

    /// Endpoint disabled by configuration
    #[error("{0}")]
    FeatureDisabled(&'static str),

    /// Outbound email failed
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UsersError {
    pub fn validation(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        UsersError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// "This field is required."
    pub fn required(field: &'static str) -> Self {
        Self::validation(field, "This field is required.")
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            UsersError::Validation { .. }
            | UsersError::MalformedBody(_)
            | UsersError::InvalidUid
            | UsersError::InvalidAccountToken
            | UsersError::FeatureDisabled(_) => StatusCode::BAD_REQUEST,
            UsersError::EmailTaken => StatusCode::CONFLICT,
            UsersError::InvalidCredentials
            | UsersError::NotAuthenticated
            | UsersError::InvalidToken
            | UsersError::TokenUserInactive => StatusCode::UNAUTHORIZED,
            UsersError::AccountNotVerified | UsersError::StaleToken => StatusCode::FORBIDDEN,
            UsersError::Mail(_) | UsersError::Database(_) | UsersError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UsersError::Validation { .. }
            | UsersError::MalformedBody(_)
            | UsersError::InvalidUid
            | UsersError::InvalidAccountToken
            | UsersError::FeatureDisabled(_) => ErrorKind::BadRequest,
            UsersError::EmailTaken => ErrorKind::Conflict,
            UsersError::InvalidCredentials
            | UsersError::NotAuthenticated
            | UsersError::InvalidToken
            | UsersError::TokenUserInactive => ErrorKind::Unauthorized,
            UsersError::AccountNotVerified | UsersError::StaleToken => ErrorKind::Forbidden,
            UsersError::Mail(_) | UsersError::Database(_) | UsersError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures get a generic message; their cause is logged.
    pub fn to_app_error(&self) -> AppError {
        match self {
            UsersError::Validation { field, message } => {
                AppError::bad_request(message.clone()).with_field(field.clone())
            }
            UsersError::EmailTaken => AppError::conflict(self.to_string()).with_field("email"),
            UsersError::InvalidToken => AppError::unauthorized(self.to_string())
                .with_code("token_not_valid")
                .with_action("Log in again to obtain a new token"),
            UsersError::TokenUserInactive => {
                AppError::unauthorized(self.to_string()).with_code("user_not_found")
            }
            UsersError::NotAuthenticated => {
                AppError::unauthorized(self.to_string()).with_code("not_authenticated")
            }
            UsersError::InvalidUid => AppError::bad_request(self.to_string()).with_field("uid"),
            UsersError::InvalidAccountToken => {
                AppError::bad_request(self.to_string()).with_field("token")
            }
            UsersError::StaleToken => AppError::forbidden(self.to_string()).with_field("token"),
            UsersError::Mail(_) | UsersError::Database(_) | UsersError::Internal(_) => {
                AppError::internal("A server error occurred.")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            UsersError::Database(e) => {
                tracing::error!(error = %e, "Users database error");
            }
            UsersError::Mail(e) => {
                tracing::error!(error = %e, "Failed to send account email");
            }
            UsersError::Internal(msg) => {
                tracing::error!(message = %msg, "Users internal error");
            }
            UsersError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            UsersError::InvalidToken => {
                tracing::warn!("Rejected invalid or expired token");
            }
            _ => {
                tracing::debug!(error = %self, "Users error");
            }
        }
    }
}

impl IntoResponse for UsersError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for UsersError {
    fn from(err: AppError) -> Self {
        UsersError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for UsersError {
    fn from(rejection: JsonRejection) -> Self {
        UsersError::MalformedBody(rejection.body_text())
    }
}
