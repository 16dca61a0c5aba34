//! Login Use Case
//!
//! Wraps [`TokenObtainUseCase`] with one extra branch: when the submitted
//! email belongs to an account that was never activated, a fresh activation
//! email is sent and the login is refused with `AccountNotVerified`.
//!
//! ```text
//! checking ──(match, inactive)──▶ email sent ──▶ 403
//!     │
//!     └──(no match / active)────▶ delegate  ──▶ token pair | 400 | 401
//! ```

use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::config::UsersConfig;
use crate::application::emails::{AccountEmail, AccountMailer};
use crate::application::forms::SendEmailResetForm;
use crate::application::jwt::{TokenPair, TokenService};
use crate::application::token_obtain::{TokenObtainInput, TokenObtainUseCase};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{UsersError, UsersResult};

pub struct LoginUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    tokens: Arc<TokenService>,
    config: Arc<UsersConfig>,
}

impl<R, M> LoginUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    pub fn new(
        user_repo: Arc<R>,
        mailer: Arc<AccountMailer<M>>,
        tokens: Arc<TokenService>,
        config: Arc<UsersConfig>,
    ) -> Self {
        Self {
            user_repo,
            mailer,
            tokens,
            config,
        }
    }

    /// ## Arguments
    /// * `site` - Scheme and host for the activation link
    /// * `input` - Submitted credentials
    pub async fn execute(&self, site: &RequestSite, input: TokenObtainInput) -> UsersResult<TokenPair> {
        if let Some(user) = self.find_inactive(input.email.as_deref()).await? {
            self.send_activation_email(site, &user).await?;

            tracing::info!(user_id = %user.user_id, "Login refused for unverified account");
            return Err(UsersError::AccountNotVerified);
        }

        TokenObtainUseCase::new(self.user_repo.clone(), self.tokens.clone(), self.config.clone())
            .execute(input)
            .await
    }

    /// The inactive account registered under `email`, if any
    ///
    /// Absent or malformed addresses simply do not match.
    async fn find_inactive(&self, email: Option<&str>) -> UsersResult<Option<User>> {
        let Some(email) = email.and_then(|e| Email::new(e).ok()) else {
            return Ok(None);
        };

        let user = self.user_repo.find_by_email(&email).await?;
        Ok(user.filter(|u| !u.is_active))
    }

    async fn send_activation_email(&self, site: &RequestSite, user: &User) -> UsersResult<()> {
        // Fail before anything is sent if the stored address does not validate
        SendEmailResetForm::for_user(user).validate()?;

        self.mailer.send(AccountEmail::Activation, site, user).await
    }
}
