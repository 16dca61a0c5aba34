//! Token Obtain Use Case
//!
//! Standard email + password login. Issues a token pair for active accounts
//! with matching credentials; everything else is "no active account".

use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::application::jwt::{TokenPair, TokenService};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{UsersError, UsersResult};

/// Token obtain input
///
/// Both fields are optional so a missing one is a field error.
#[derive(Debug, Default)]
pub struct TokenObtainInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token obtain use case
pub struct TokenObtainUseCase<R>
where
    R: UserRepository,
{
    user_repo: Arc<R>,
    tokens: Arc<TokenService>,
    config: Arc<UsersConfig>,
}

impl<R> TokenObtainUseCase<R>
where
    R: UserRepository,
{
    pub fn new(user_repo: Arc<R>, tokens: Arc<TokenService>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: TokenObtainInput) -> UsersResult<TokenPair> {
        let email = input.email.ok_or_else(|| UsersError::required("email"))?;
        let password = input.password.ok_or_else(|| UsersError::required("password"))?;

        // An address that cannot exist cannot match
        let email = Email::new(email).map_err(|_| UsersError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(UsersError::InvalidCredentials)?;

        let raw_password = RawPassword::for_verification(password);
        if !user.password.verify(&raw_password, self.config.pepper()) {
            return Err(UsersError::InvalidCredentials);
        }

        // Inactive accounts never receive tokens
        if !user.is_active {
            return Err(UsersError::InvalidCredentials);
        }

        if self.config.update_last_login {
            user.record_login();
            self.user_repo.update(&user).await?;
        }

        let pair = self.tokens.issue_pair(&user.user_id)?;

        tracing::info!(user_id = %user.user_id, "Token pair issued");

        Ok(pair)
    }
}
