//! Token Refresh / Verify Use Cases

use serde::Serialize;
use std::sync::Arc;

use crate::application::jwt::{TokenService, TokenType};
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};

/// Fresh access token
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// Exchange a refresh token for a new access token
pub struct TokenRefreshUseCase<R>
where
    R: UserRepository,
{
    user_repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> TokenRefreshUseCase<R>
where
    R: UserRepository,
{
    pub fn new(user_repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { user_repo, tokens }
    }

    pub async fn execute(&self, refresh: Option<String>) -> UsersResult<AccessToken> {
        let refresh = refresh.ok_or_else(|| UsersError::required("refresh"))?;
        let claims = self.tokens.decode(&refresh, Some(TokenType::Refresh))?;

        // Deactivated since the refresh token was issued
        let user = self
            .user_repo
            .find_by_id(&claims.user_id()?)
            .await?
            .filter(|u| u.is_active)
            .ok_or(UsersError::TokenUserInactive)?;

        let access = self.tokens.issue(&user.user_id, TokenType::Access)?;

        tracing::debug!(user_id = %user.user_id, "Access token refreshed");

        Ok(AccessToken { access })
    }
}

/// Check that a token of either type is authentic and unexpired
pub struct TokenVerifyUseCase {
    tokens: Arc<TokenService>,
}

impl TokenVerifyUseCase {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn execute(&self, token: Option<String>) -> UsersResult<()> {
        let token = token.ok_or_else(|| UsersError::required("token"))?;
        self.tokens.decode(&token, None)?;
        Ok(())
    }
}
