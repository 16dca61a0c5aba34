//! Application Configuration
//!
//! Configuration for the Users application layer.

use std::time::Duration;

use platform::site::SitePolicy;

/// Users application configuration
#[derive(Debug, Clone)]
pub struct UsersConfig {
    /// Secret for JWT signing and account-token HMACs
    pub secret_key: Vec<u8>,
    /// Access token lifetime (5 minutes)
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime (1 day)
    pub refresh_token_lifetime: Duration,
    /// Validity of activation / password-reset links (3 days)
    pub account_token_timeout: Duration,
    /// Register accounts inactive and email an activation link
    pub send_activation_email: bool,
    /// Email a confirmation once an account is active
    pub send_confirmation_email: bool,
    /// Email a notice after a password change or reset
    pub password_changed_email_confirmation: bool,
    /// Stamp `last_login` when a token pair is issued
    pub update_last_login: bool,
    /// Frontend path of the activation page, with `{uid}` and `{token}` placeholders
    pub activation_url: String,
    /// Frontend path of the password reset page, with `{uid}` and `{token}` placeholders
    pub password_reset_confirm_url: String,
    /// Site name shown in emails (defaults to the request domain)
    pub site_name: Option<String>,
    /// Hosts accepted from request headers for links in emails
    pub allowed_hosts: Vec<String>,
    /// Read the site from `X-Forwarded-*` headers (behind a trusted proxy)
    pub trust_forwarded_headers: bool,
    /// Domain used in links when the request names no allowed host
    pub default_domain: String,
    /// Scheme used in links unless a proxy header says otherwise
    pub default_protocol: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            secret_key: vec![0u8; 32],
            access_token_lifetime: Duration::from_secs(5 * 60), // 5 minutes
            refresh_token_lifetime: Duration::from_secs(24 * 3600), // 1 day
            account_token_timeout: Duration::from_secs(3 * 24 * 3600), // 3 days
            send_activation_email: true,
            send_confirmation_email: false,
            password_changed_email_confirmation: false,
            update_last_login: false,
            activation_url: "#/activate/{uid}/{token}".to_string(),
            password_reset_confirm_url: "#/password/reset/confirm/{uid}/{token}".to_string(),
            site_name: None,
            allowed_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
            ],
            trust_forwarded_headers: false,
            default_domain: "localhost:8000".to_string(),
            default_protocol: "http".to_string(),
            password_pepper: None,
        }
    }
}

impl UsersConfig {
    /// Create config with a random secret key
    pub fn with_random_secret() -> Self {
        Self {
            secret_key: platform::crypto::random_bytes(32),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Host policy for links in outgoing email
    pub fn site_policy(&self) -> SitePolicy<'_> {
        SitePolicy {
            allowed_hosts: &self.allowed_hosts,
            trust_forwarded_headers: self.trust_forwarded_headers,
            default_domain: &self.default_domain,
            default_protocol: &self.default_protocol,
        }
    }

    /// Fill `{uid}` and `{token}` in a link template
    pub fn format_link(template: &str, uid: &str, token: &str) -> String {
        template.replace("{uid}", uid).replace("{token}", token)
    }
}
