//! Current User Use Case
//!
//! Read and edit the authenticated user's profile. Changing the email while
//! activation emails are enabled deactivates the account until the new
//! address is confirmed.

use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::config::UsersConfig;
use crate::application::emails::{AccountEmail, AccountMailer};
use crate::application::forms::UserChangeForm;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};

pub struct UpdateProfileUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    config: Arc<UsersConfig>,
}

impl<R, M> UpdateProfileUseCase<R, M>
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

    pub async fn execute(
        &self,
        site: &RequestSite,
        mut user: User,
        form: UserChangeForm,
    ) -> UsersResult<User> {
        let changes = form.validate()?;

        if let Some(email) = &changes.email {
            if *email != user.email && self.user_repo.exists_by_email(email).await? {
                return Err(UsersError::EmailTaken);
            }
        }

        let email_changed = changes.apply_to(&mut user);
        let reverify = email_changed && self.config.send_activation_email;
        if reverify {
            user.deactivate();
        }

        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, email_changed, "Profile updated");

        if reverify {
            self.mailer.send(AccountEmail::Activation, site, &user).await?;
        }

        Ok(user)
    }
}
