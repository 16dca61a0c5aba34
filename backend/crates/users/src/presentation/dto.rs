//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so that a missing field is reported as a
//! field-level 400 by the use case rather than a body rejection.

use axum::extract::FromRequest;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::application::{SetPasswordInput, TokenObtainInput, UidAndToken};
use crate::domain::entity::user::User;
use crate::error::UsersError;

/// JSON body extractor whose rejection renders as a problem document
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(UsersError))]
pub struct JsonBody<T>(pub T);

// ============================================================================
// JWT
// ============================================================================

/// Token obtain / login request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenObtainRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Any JSON scalar or structure as text; `null` counts as missing
///
/// A non-string email can never match an account, so it reaches the
/// credential check instead of failing the whole body.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl From<TokenObtainRequest> for TokenObtainInput {
    fn from(req: TokenObtainRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
        }
    }
}

/// Token refresh request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: Option<String>,
}

/// Token verify request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenVerifyRequest {
    pub token: Option<String>,
}

/// Token verify response (always empty)
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenVerifyResponse {}

// ============================================================================
// Users
// ============================================================================

/// Activation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivationRequest {
    pub uid: Option<String>,
    pub token: Option<String>,
}

impl From<ActivationRequest> for UidAndToken {
    fn from(req: ActivationRequest) -> Self {
        Self {
            uid: req.uid,
            token: req.token,
        }
    }
}

/// Set password request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub re_new_password: Option<String>,
}

impl From<SetPasswordRequest> for SetPasswordInput {
    fn from(req: SetPasswordRequest) -> Self {
        Self {
            current_password: req.current_password,
            new_password: req.new_password,
            re_new_password: req.re_new_password,
        }
    }
}

/// Password reset confirmation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub uid: Option<String>,
    pub token: Option<String>,
    pub new_password: Option<String>,
    pub re_new_password: Option<String>,
}

/// Public user representation
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.as_str().to_string(),
            last_name: user.last_name.as_str().to_string(),
            middle_name: user.middle_name.as_str().to_string(),
        }
    }
}
