//! Password Use Cases
//!
//! Change the password of the authenticated user, or reset a forgotten one
//! through an emailed link.

use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::activation::{UidAndToken, verify_link};
use crate::application::config::UsersConfig;
use crate::application::emails::{AccountEmail, AccountMailer};
use crate::application::forms::SendEmailResetForm;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{UsersError, UsersResult};

/// Set password input
#[derive(Debug, Default)]
pub struct SetPasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub re_new_password: Option<String>,
}

/// Reset confirmation input
#[derive(Debug, Default)]
pub struct ResetConfirmInput {
    pub link: UidAndToken,
    pub new_password: Option<String>,
    pub re_new_password: Option<String>,
}

/// Validate `new_password` (and its retype, when given) and hash it
fn new_password(
    new_password: Option<String>,
    re_new_password: Option<String>,
    pepper: Option<&[u8]>,
) -> UsersResult<UserPassword> {
    let new_password = new_password.ok_or_else(|| UsersError::required("new_password"))?;
    if let Some(retyped) = re_new_password {
        if retyped != new_password {
            return Err(UsersError::validation(
                "non_field_errors",
                "The two password fields didn't match.",
            ));
        }
    }

    let raw = RawPassword::new("new_password", new_password)?;
    UserPassword::from_raw(&raw, pepper)
}

pub struct PasswordUseCase<R, M>
where
    R: UserRepository,
    M: MailTransport + Sync,
{
    user_repo: Arc<R>,
    mailer: Arc<AccountMailer<M>>,
    config: Arc<UsersConfig>,
}

impl<R, M> PasswordUseCase<R, M>
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

    /// Change the password of an authenticated user
    pub async fn set_password(
        &self,
        site: &RequestSite,
        mut user: User,
        input: SetPasswordInput,
    ) -> UsersResult<()> {
        let current = input
            .current_password
            .ok_or_else(|| UsersError::required("current_password"))?;
        if !user
            .password
            .verify(&RawPassword::for_verification(current), self.config.pepper())
        {
            return Err(UsersError::validation("current_password", "Invalid password."));
        }

        let password = new_password(input.new_password, input.re_new_password, self.config.pepper())?;
        user.set_password(password);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");

        self.notify_changed(site, &user).await
    }

    /// Email a reset link to an active account
    ///
    /// Succeeds whether or not the address matches, so it cannot be used to
    /// enumerate registered emails.
    pub async fn request_reset(&self, site: &RequestSite, form: SendEmailResetForm) -> UsersResult<()> {
        let email = form.validate()?;

        match self.user_repo.find_by_email(&email).await? {
            Some(user) if user.is_active => {
                self.mailer.send(AccountEmail::PasswordReset, site, &user).await?;
            }
            _ => tracing::debug!("Password reset requested for unknown or inactive address"),
        }

        Ok(())
    }

    /// Set a new password from a reset link
    pub async fn confirm_reset(&self, site: &RequestSite, input: ResetConfirmInput) -> UsersResult<()> {
        let mut user = verify_link(self.user_repo.as_ref(), &self.mailer, input.link).await?;

        let password = new_password(input.new_password, input.re_new_password, self.config.pepper())?;
        user.set_password(password);
        // Also retires the link: last_login is part of the token
        user.record_login();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password reset");

        self.notify_changed(site, &user).await
    }

    async fn notify_changed(&self, site: &RequestSite, user: &User) -> UsersResult<()> {
        if self.config.password_changed_email_confirmation {
            self.mailer
                .send(AccountEmail::PasswordChangedConfirmation, site, user)
                .await?;
        }
        Ok(())
    }
}
