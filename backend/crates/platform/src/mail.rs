//! Templated Email
//!
//! Renders an HTML template with a context, derives the plain text
//! alternative with [`strip_tags`], and hands a multipart message to a
//! transport.
//!
//! Both collaborators are capability traits so callers can swap them:
//! - [`TemplateRenderer`] - `render(name, context) -> html`
//! - [`MailTransport`] - `send(message)`
//!
//! Transports provided here:
//! - [`SmtpTransport`] - lettre async SMTP (pooled)
//! - [`ConsoleTransport`] - logs the message, for local development
//! - [`MemoryTransport`] - keeps an outbox, for tests
//!
//! Sending is awaited inline. Errors propagate to the caller; there is no
//! retry.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use thiserror::Error;

use crate::html::strip_tags;

pub type MailResult<T> = Result<T, MailError>;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid email address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("Email has no recipients")]
    NoRecipients,

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Mail transport error: {0}")]
    Transport(String),
}

// ============================================================================
// Message
// ============================================================================

/// A fully rendered multipart email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from_email: String,
    pub to: Vec<String>,
    pub subject: String,
    /// `text/plain` part, derived from `html_body`
    pub text_body: String,
    /// `text/html` part
    pub html_body: String,
}

/// One address or a list of addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Self(addresses.iter().map(|a| a.to_string()).collect())
    }
}

// ============================================================================
// Template rendering
// ============================================================================

/// Renders a named template against a JSON context
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template_name: &str, context: &serde_json::Value) -> MailResult<String>;
}

/// MiniJinja-backed renderer
///
/// Templates are looked up in the search directories in order, then in the
/// built-in set. HTML auto-escaping applies to `.html` templates.
pub struct MiniJinjaRenderer {
    env: minijinja::Environment<'static>,
}

impl MiniJinjaRenderer {
    /// ## Arguments
    /// * `search_dirs` - Directories searched first, in order
    /// * `builtins` - `(name, source)` pairs used when no directory has the template
    pub fn new<I, N, S>(search_dirs: Vec<PathBuf>, builtins: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let builtins: HashMap<String, String> = builtins
            .into_iter()
            .map(|(name, source)| (name.into(), source.into()))
            .collect();

        let mut env = minijinja::Environment::new();
        env.set_loader(move |name| {
            for dir in &search_dirs {
                if let Some(path) = safe_join(dir, name) {
                    if path.is_file() {
                        return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                            minijinja::Error::new(
                                minijinja::ErrorKind::InvalidOperation,
                                format!("could not read template {}", path.display()),
                            )
                            .with_source(e)
                        });
                    }
                }
            }
            Ok(builtins.get(name).cloned())
        });

        Self { env }
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template_name: &str, context: &serde_json::Value) -> MailResult<String> {
        let template = self.env.get_template(template_name)?;
        Ok(template.render(context)?)
    }
}

/// Join a template name onto a directory, refusing to escape it
fn safe_join(base: &Path, name: &str) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

// ============================================================================
// Transports
// ============================================================================

/// Outbound mail delivery
#[trait_variant::make(MailTransport: Send)]
pub trait LocalMailTransport {
    async fn send(&self, message: &EmailMessage) -> MailResult<()>;
}

/// SMTP connection security
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection (local relays, mail catchers)
    None,
    /// Upgrade with STARTTLS
    #[default]
    StartTls,
    /// Implicit TLS (SMTPS)
    Tls,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security: SmtpSecurity,
    pub timeout: Duration,
}

/// lettre async SMTP transport
#[derive(Clone)]
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(config: &SmtpConfig) -> MailResult<Self> {
        let builder = match config.security {
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::Transport(e.to_string()))?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
        };

        let mut builder = builder.port(config.port).timeout(Some(config.timeout));
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

impl MailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        let email = to_lettre_message(message)?;
        self.inner
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> MailResult<Mailbox> {
    address.parse::<Mailbox>().map_err(|e| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

fn to_lettre_message(message: &EmailMessage) -> MailResult<Message> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&message.from_email)?)
        .subject(message.subject.clone());
    for to in &message.to {
        builder = builder.to(parse_mailbox(to)?);
    }

    Ok(builder.multipart(MultiPart::alternative_plain_html(
        message.text_body.clone(),
        message.html_body.clone(),
    ))?)
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct ConsoleTransport;

impl MailTransport for ConsoleTransport {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        tracing::info!(
            from = %message.from_email,
            to = ?message.to,
            subject = %message.subject,
            body = %message.text_body,
            "Email (console backend)"
        );
        Ok(())
    }
}

/// Collects messages in an in-memory outbox
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far
    pub fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl MailTransport for MemoryTransport {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        self.outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}

/// Transport selected by configuration at startup
#[derive(Clone)]
pub enum EmailBackend {
    Smtp(SmtpTransport),
    Console(ConsoleTransport),
    Memory(MemoryTransport),
}

impl MailTransport for EmailBackend {
    async fn send(&self, message: &EmailMessage) -> MailResult<()> {
        match self {
            EmailBackend::Smtp(t) => MailTransport::send(t, message).await,
            EmailBackend::Console(t) => MailTransport::send(t, message).await,
            EmailBackend::Memory(t) => MailTransport::send(t, message).await,
        }
    }
}

// ============================================================================
// Templated sender
// ============================================================================

/// Sends HTML template emails with an auto-generated plain text fallback
pub struct TemplateMailer<T> {
    renderer: Arc<dyn TemplateRenderer>,
    transport: T,
    default_from_email: String,
}

impl<T> TemplateMailer<T>
where
    T: MailTransport + Sync,
{
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        transport: T,
        default_from_email: impl Into<String>,
    ) -> Self {
        Self {
            renderer,
            transport,
            default_from_email: default_from_email.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Render `template_name` with `context` and send it
    ///
    /// ## Arguments
    /// * `subject` - Email subject (line breaks are folded into spaces)
    /// * `to` - A single address or a list of addresses
    /// * `template_name` - Path of the HTML template, e.g. `email/activation.html`
    /// * `context` - Values available to the template
    pub async fn send_templated_email(
        &self,
        subject: &str,
        to: impl Into<Recipients>,
        template_name: &str,
        context: &serde_json::Value,
    ) -> MailResult<()> {
        let to = to.into().into_vec();
        if to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let html_body = self.renderer.render(template_name, context)?;
        let text_body = strip_tags(&html_body);

        let message = EmailMessage {
            from_email: self.default_from_email.clone(),
            to,
            subject: fold_subject(subject),
            text_body,
            html_body,
        };

        self.transport.send(&message).await?;

        tracing::info!(
            template = template_name,
            recipients = message.to.len(),
            "Templated email sent"
        );

        Ok(())
    }
}

/// Header injection guard: subjects are single-line
fn fold_subject(subject: &str) -> String {
    subject
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
