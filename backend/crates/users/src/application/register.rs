//! Register Use Case
//!
//! Creates an account. With activation emails enabled the account starts
//! inactive and an activation link is sent; otherwise it is active at once
//! and an optional confirmation email goes out.

use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::config::UsersConfig;
use crate::application::emails::{AccountEmail, AccountMailer};
use crate::application::forms::UserCreationForm;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};

pub struct RegisterUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    config: Arc<UsersConfig>,
}

impl<R, M> RegisterUseCase<R, M>
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

    pub async fn execute(&self, site: &RequestSite, form: UserCreationForm) -> UsersResult<User> {
        let new_user = form.validate(self.config.pepper())?;

        if self.user_repo.exists_by_email(&new_user.email).await? {
            return Err(UsersError::EmailTaken);
        }

        let user = User::new(new_user, !self.config.send_activation_email);
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            is_active = user.is_active,
            "User registered"
        );

        if self.config.send_activation_email {
            self.mailer.send(AccountEmail::Activation, site, &user).await?;
        } else if self.config.send_confirmation_email {
            self.mailer.send(AccountEmail::Confirmation, site, &user).await?;
        }

        Ok(user)
    }
}
