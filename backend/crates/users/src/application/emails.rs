//! Account Emails
//!
//! Activation, confirmation, password reset and password-changed notices.
//! Each is a templated email sent to the user's own address with links built
//! from an explicit [`RequestSite`].

use platform::mail::{MailTransport, TemplateMailer};
use platform::site::RequestSite;
use serde_json::json;
use std::sync::Arc;

use crate::application::account_token::{AccountTokenGenerator, encode_uid};
use crate::application::config::UsersConfig;
use crate::domain::entity::user::User;
use crate::error::UsersResult;

/// Built-in templates, overridable from a template directory
pub const BUILTIN_TEMPLATES: [(&str, &str); 4] = [
    (
        "email/activation.html",
        include_str!("../../templates/email/activation.html"),
    ),
    (
        "email/confirmation.html",
        include_str!("../../templates/email/confirmation.html"),
    ),
    (
        "email/password_reset.html",
        include_str!("../../templates/email/password_reset.html"),
    ),
    (
        "email/password_changed_confirmation.html",
        include_str!("../../templates/email/password_changed_confirmation.html"),
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEmail {
    Activation,
    Confirmation,
    PasswordReset,
    PasswordChangedConfirmation,
}

impl AccountEmail {
    pub fn template_name(&self) -> &'static str {
        match self {
            AccountEmail::Activation => "email/activation.html",
            AccountEmail::Confirmation => "email/confirmation.html",
            AccountEmail::PasswordReset => "email/password_reset.html",
            AccountEmail::PasswordChangedConfirmation => "email/password_changed_confirmation.html",
        }
    }

    pub fn subject(&self, site_name: &str) -> String {
        match self {
            AccountEmail::Activation => format!("Account activation on {}", site_name),
            AccountEmail::Confirmation => {
                format!("{} - Your account has been successfully created and activated!", site_name)
            }
            AccountEmail::PasswordReset => format!("Password reset on {}", site_name),
            AccountEmail::PasswordChangedConfirmation => {
                format!("{} - Your password has been successfully changed!", site_name)
            }
        }
    }

    /// Link template for emails that carry a uid/token pair
    fn link_template<'a>(&self, config: &'a UsersConfig) -> Option<&'a str> {
        match self {
            AccountEmail::Activation => Some(&config.activation_url),
            AccountEmail::PasswordReset => Some(&config.password_reset_confirm_url),
            AccountEmail::Confirmation | AccountEmail::PasswordChangedConfirmation => None,
        }
    }
}

/// Sends [`AccountEmail`]s through a [`TemplateMailer`]
pub struct AccountMailer<M> {
    mailer: TemplateMailer<M>,
    tokens: AccountTokenGenerator,
    config: Arc<UsersConfig>,
}

impl<M> AccountMailer<M>
where
    M: MailTransport + Sync,
{
    pub fn new(mailer: TemplateMailer<M>, config: Arc<UsersConfig>) -> Self {
        let tokens = AccountTokenGenerator::new(&config.secret_key, config.account_token_timeout);
        Self {
            mailer,
            tokens,
            config,
        }
    }

    pub fn tokens(&self) -> &AccountTokenGenerator {
        &self.tokens
    }

    pub fn transport(&self) -> &M {
        self.mailer.transport()
    }

    /// Render and send `email` to `user`
    ///
    /// ## Arguments
    /// * `email` - Which account email to send
    /// * `site` - Scheme and host the links point at
    /// * `user` - Recipient
    pub async fn send(&self, email: AccountEmail, site: &RequestSite, user: &User) -> UsersResult<()> {
        let site_name = self
            .config
            .site_name
            .clone()
            .unwrap_or_else(|| site.domain.clone());

        let mut context = json!({
            "user": {
                "email": user.email.as_str(),
                "first_name": user.first_name.as_str(),
                "last_name": user.last_name.as_str(),
                "middle_name": user.middle_name.as_str(),
                "full_name": user.full_name(),
            },
            "domain": site.domain,
            "protocol": site.protocol,
            "site_name": site_name,
        });

        if let (Some(link), Some(map)) = (email.link_template(&self.config), context.as_object_mut()) {
            let uid = encode_uid(&user.user_id);
            let token = self.tokens.make_token(user);
            map.insert("url".to_string(), UsersConfig::format_link(link, &uid, &token).into());
            map.insert("uid".to_string(), uid.into());
            map.insert("token".to_string(), token.into());
        }

        self.mailer
            .send_templated_email(
                &email.subject(&site_name),
                user.email.as_str(),
                email.template_name(),
                &context,
            )
            .await?;

        tracing::info!(user_id = %user.user_id, email = ?email, "Account email sent");
        Ok(())
    }
}
