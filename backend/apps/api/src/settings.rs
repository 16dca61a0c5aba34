//! Settings
//!
//! Layered configuration: the settings profile named by `DJANGO_SETTINGS_MODULE`
//! (a dotted path under the base directory, `config.settings` resolving to
//! `config/settings.toml`), then `APP__<SECTION>__<KEY>` environment
//! variables. Every key has a default, so a missing profile is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use config::{Config, ConfigError, Environment, File};
use platform::mail::{SmtpConfig, SmtpSecurity};
use serde::Deserialize;
use users::UsersConfig;

pub const DEFAULT_SETTINGS_MODULE: &str = "config.settings";

/// Variables naming the settings profile, in lookup order
const SETTINGS_MODULE_VARS: [&str; 2] = ["DJANGO_SETTINGS_MODULE", "SETTINGS_MODULE"];

/// Prefix of environment overrides
const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    pub auth: AuthSettings,
    pub cors: CorsSettings,
    pub templates: TemplateSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Falls back to `DATABASE_URL`; without either the in-memory store is used
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackendKind {
    Smtp,
    #[default]
    Console,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub backend: EmailBackendKind,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
    pub timeout_secs: u64,
    pub default_from_email: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            backend: EmailBackendKind::default(),
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            security: SmtpSecurity::default(),
            timeout_secs: 10,
            default_from_email: "webmaster@localhost".to_string(),
        }
    }
}

impl EmailSettings {
    pub fn smtp_config(&self) -> SmtpConfig {
        SmtpConfig {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            security: self.security,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Base64-encoded signing key
    pub secret_key: Option<String>,
    pub access_token_lifetime_secs: u64,
    pub refresh_token_lifetime_secs: u64,
    pub account_token_timeout_secs: u64,
    pub send_activation_email: bool,
    pub send_confirmation_email: bool,
    pub password_changed_email_confirmation: bool,
    pub update_last_login: bool,
    pub activation_url: String,
    pub password_reset_confirm_url: String,
    pub site_name: Option<String>,
    /// Hosts accepted from `Host` for links in emails (`.example.com`, `*`)
    pub allowed_hosts: Vec<String>,
    /// Honor `X-Forwarded-Host` / `X-Forwarded-Proto`
    pub trust_forwarded_headers: bool,
    pub default_domain: String,
    pub default_protocol: String,
    pub password_pepper: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let defaults = UsersConfig::default();
        Self {
            secret_key: None,
            access_token_lifetime_secs: defaults.access_token_lifetime.as_secs(),
            refresh_token_lifetime_secs: defaults.refresh_token_lifetime.as_secs(),
            account_token_timeout_secs: defaults.account_token_timeout.as_secs(),
            send_activation_email: defaults.send_activation_email,
            send_confirmation_email: defaults.send_confirmation_email,
            password_changed_email_confirmation: defaults.password_changed_email_confirmation,
            update_last_login: defaults.update_last_login,
            activation_url: defaults.activation_url,
            password_reset_confirm_url: defaults.password_reset_confirm_url,
            site_name: defaults.site_name,
            allowed_hosts: defaults.allowed_hosts,
            trust_forwarded_headers: defaults.trust_forwarded_headers,
            default_domain: defaults.default_domain,
            default_protocol: defaults.default_protocol,
            password_pepper: None,
        }
    }
}

impl AuthSettings {
    /// Build the users configuration
    ///
    /// Without a configured key, debug builds sign with a random one (tokens
    /// do not survive a restart); release builds refuse to start.
    pub fn users_config(&self) -> anyhow::Result<UsersConfig> {
        let secret_key = match &self.secret_key {
            Some(encoded) => general_purpose::STANDARD.decode(encoded.trim())?,
            None if cfg!(debug_assertions) => {
                tracing::warn!("auth.secret_key not set, using a random signing key");
                platform::crypto::random_bytes(32)
            }
            None => anyhow::bail!("auth.secret_key must be set in production"),
        };
        if secret_key.len() < 32 {
            anyhow::bail!("auth.secret_key must decode to at least 32 bytes");
        }

        Ok(UsersConfig {
            secret_key,
            access_token_lifetime: Duration::from_secs(self.access_token_lifetime_secs),
            refresh_token_lifetime: Duration::from_secs(self.refresh_token_lifetime_secs),
            account_token_timeout: Duration::from_secs(self.account_token_timeout_secs),
            send_activation_email: self.send_activation_email,
            send_confirmation_email: self.send_confirmation_email,
            password_changed_email_confirmation: self.password_changed_email_confirmation,
            update_last_login: self.update_last_login,
            activation_url: self.activation_url.clone(),
            password_reset_confirm_url: self.password_reset_confirm_url.clone(),
            site_name: self.site_name.clone(),
            allowed_hosts: self.allowed_hosts.clone(),
            trust_forwarded_headers: self.trust_forwarded_headers,
            default_domain: self.default_domain.clone(),
            default_protocol: self.default_protocol.clone(),
            password_pepper: self.password_pepper.clone().map(String::into_bytes),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Extra template directories, searched before the built-in templates
    pub dirs: Vec<PathBuf>,
}

/// Settings module named by the environment, else the default
pub fn settings_module(lookup: impl Fn(&str) -> Option<String>) -> String {
    SETTINGS_MODULE_VARS
        .iter()
        .find_map(|&name| lookup(name).filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SETTINGS_MODULE.to_string())
}

/// `config.settings` -> `<base_dir>/config/settings.toml`
pub fn settings_path(base_dir: &Path, module: &str) -> PathBuf {
    let mut path = base_dir.to_path_buf();
    path.extend(module.split('.').filter(|part| !part.is_empty()));
    path.set_extension("toml");
    path
}

impl Settings {
    /// Load the profile named by `DJANGO_SETTINGS_MODULE`, layered with the environment
    pub fn load(base_dir: &Path) -> Result<Self, ConfigError> {
        let module = settings_module(|name| std::env::var(name).ok());
        let path = settings_path(base_dir, &module);

        tracing::info!(settings_module = %module, path = %path.display(), "Loading settings");

        Self::from_sources(&path, Some(ENV_PREFIX))
    }

    /// Load from a settings file and, when given, an environment prefix
    pub fn from_sources(path: &Path, env_prefix: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::from(path).required(false));

        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_hosts")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("templates.dirs"),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Configured database URL, else `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.database
            .url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
    }

    /// Template search path: `<base_dir>/templates`, then the configured dirs
    pub fn template_dirs(&self, base_dir: &Path) -> Vec<PathBuf> {
        std::iter::once(base_dir.join("templates"))
            .chain(self.templates.dirs.iter().map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    base_dir.join(dir)
                }
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_path() {
        let base = Path::new("/srv/app");
        assert_eq!(
            settings_path(base, "config.settings"),
            PathBuf::from("/srv/app/config/settings.toml")
        );
        assert_eq!(
            settings_path(base, "config.settings.production"),
            PathBuf::from("/srv/app/config/settings/production.toml")
        );
    }

    #[test]
    fn test_settings_module_from_environment() {
        let module = settings_module(|name| {
            (name == "DJANGO_SETTINGS_MODULE").then(|| "config.settings.production".to_string())
        });
        assert_eq!(module, "config.settings.production");
        assert_eq!(
            settings_path(Path::new("/srv/app"), &module),
            PathBuf::from("/srv/app/config/settings/production.toml")
        );
    }

    #[test]
    fn test_settings_module_alias_and_default() {
        let alias =
            settings_module(|name| (name == "SETTINGS_MODULE").then(|| "config.local".to_string()));
        assert_eq!(alias, "config.local");

        let both = settings_module(|name| Some(format!("config.{}", name.to_lowercase())));
        assert_eq!(both, "config.django_settings_module");

        assert_eq!(settings_module(|_| None), DEFAULT_SETTINGS_MODULE);
        assert_eq!(settings_module(|_| Some("  ".to_string())), DEFAULT_SETTINGS_MODULE);
    }

    #[test]
    fn test_missing_profile_uses_defaults() {
        let settings =
            Settings::from_sources(Path::new("/nonexistent/settings.toml"), None).unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.email.backend, EmailBackendKind::Console);
        assert!(settings.auth.send_activation_email);
        assert_eq!(settings.auth.default_domain, "localhost:8000");
        assert!(!settings.auth.trust_forwarded_headers);
    }

    #[test]
    fn test_profile_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("settings-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[email]
backend = "smtp"
security = "tls"
default_from_email = "accounts@example.com"

[auth]
send_activation_email = false
site_name = "Example"
allowed_hosts = ["accounts.example.com", ".example.org"]
"#
        )
        .unwrap();

        let settings = Settings::from_sources(&path, None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.email.backend, EmailBackendKind::Smtp);
        assert_eq!(settings.email.security, SmtpSecurity::Tls);
        assert_eq!(settings.email.default_from_email, "accounts@example.com");
        assert!(!settings.auth.send_activation_email);
        assert_eq!(settings.auth.site_name.as_deref(), Some("Example"));
        assert_eq!(
            settings.auth.allowed_hosts,
            vec!["accounts.example.com".to_string(), ".example.org".to_string()]
        );
    }

    #[test]
    fn test_users_config_decodes_secret() {
        let auth = AuthSettings {
            secret_key: Some(general_purpose::STANDARD.encode([7u8; 32])),
            password_pepper: Some("pepper".to_string()),
            ..AuthSettings::default()
        };

        let config = auth.users_config().unwrap();
        assert_eq!(config.secret_key, vec![7u8; 32]);
        assert_eq!(config.pepper(), Some(b"pepper".as_slice()));
        assert_eq!(config.access_token_lifetime, Duration::from_secs(300));
    }

    #[test]
    fn test_users_config_rejects_short_secret() {
        let auth = AuthSettings {
            secret_key: Some(general_purpose::STANDARD.encode([7u8; 8])),
            ..AuthSettings::default()
        };

        assert!(auth.users_config().is_err());
    }

    #[test]
    fn test_template_dirs() {
        let mut settings = Settings::default();
        settings.templates.dirs = vec![PathBuf::from("extra"), PathBuf::from("/opt/mail")];

        let dirs = settings.template_dirs(Path::new("/srv/app"));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/srv/app/templates"),
                PathBuf::from("/srv/app/extra"),
                PathBuf::from("/opt/mail"),
            ]
        );
    }
}
