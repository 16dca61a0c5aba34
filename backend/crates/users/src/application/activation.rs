//! Activation Use Cases
//!
//! Confirm an activation link, or send a new one.

use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::account_token::decode_uid;
use crate::application::config::UsersConfig;
use crate::application::emails::{AccountEmail, AccountMailer};
use crate::application::forms::SendEmailResetForm;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};

/// Activation link input
#[derive(Debug, Default)]
pub struct UidAndToken {
    pub uid: Option<String>,
    pub token: Option<String>,
}

/// Resolve a link's uid and check its token against the user
pub(crate) async fn verify_link<R, M>(
    user_repo: &R,
    mailer: &AccountMailer<M>,
    link: UidAndToken,
) -> UsersResult<User>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    let uid = link.uid.ok_or_else(|| UsersError::required("uid"))?;
    let token = link.token.ok_or_else(|| UsersError::required("token"))?;

    let user_id = decode_uid(&uid).ok_or(UsersError::InvalidUid)?;
    let user = user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or(UsersError::InvalidUid)?;

    if !mailer.tokens().check_token(&user, &token) {
        return Err(UsersError::InvalidAccountToken);
    }

    Ok(user)
}

pub struct ActivateUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    config: Arc<UsersConfig>,
}

impl<R, M> ActivateUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    pub fn new(user_repo: Arc<R>, mailer: Arc<AccountMailer<M>>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, site: &RequestSite, link: UidAndToken) -> UsersResult<()> {
        let mut user = verify_link(self.user_repo.as_ref(), &self.mailer, link).await?;

        if user.is_active {
            return Err(UsersError::StaleToken);
        }

        user.activate();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "User activated");

        if self.config.send_confirmation_email {
            self.mailer.send(AccountEmail::Confirmation, site, &user).await?;
        }

        Ok(())
    }
}

pub struct ResendActivationUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    config: Arc<UsersConfig>,
}

impl<R, M> ResendActivationUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    pub fn new(user_repo: Arc<R>, mailer: Arc<AccountMailer<M>>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    /// Succeeds whether or not the address matches an inactive account
    pub async fn execute(&self, site: &RequestSite, form: SendEmailResetForm) -> UsersResult<()> {
        if !self.config.send_activation_email {
            return Err(UsersError::FeatureDisabled("Account activation is disabled."));
        }

        let email = form.validate()?;

        match self.user_repo.find_by_email(&email).await? {
            Some(user) if !user.is_active => {
                self.mailer.send(AccountEmail::Activation, site, &user).await?;
            }
            _ => tracing::debug!("Resend activation requested for unknown or active address"),
        }

        Ok(())
    }
}
