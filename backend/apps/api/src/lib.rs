//! API Server Library
//!
//! Router assembly shared by the binary and the integration tests.

pub mod settings;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    http::{self, Method, header},
    routing::get,
};
use platform::mail::{
    ConsoleTransport, EmailBackend, MailTransport, MemoryTransport, MiniJinjaRenderer,
    SmtpTransport, TemplateMailer,
};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use users::domain::repository::UserRepository;
use users::{AccountMailer, BUILTIN_TEMPLATES, UsersAppState, UsersConfig, users_router};

use crate::settings::{CorsSettings, EmailBackendKind, Settings};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Email transport selected by `email.backend`
pub fn email_backend(settings: &Settings) -> anyhow::Result<EmailBackend> {
    let backend = match settings.email.backend {
        EmailBackendKind::Smtp => {
            EmailBackend::Smtp(SmtpTransport::new(&settings.email.smtp_config())?)
        }
        EmailBackendKind::Console => EmailBackend::Console(ConsoleTransport),
        EmailBackendKind::Memory => EmailBackend::Memory(MemoryTransport::new()),
    };

    tracing::info!(backend = ?settings.email.backend, "Email backend configured");

    Ok(backend)
}

/// Account mailer rendering from the template search path
pub fn account_mailer<M>(
    settings: &Settings,
    base_dir: &Path,
    transport: M,
    config: Arc<UsersConfig>,
) -> AccountMailer<M>
where
    M: MailTransport + Sync,
{
    let renderer = Arc::new(MiniJinjaRenderer::new(
        settings.template_dirs(base_dir),
        BUILTIN_TEMPLATES,
    ));
    let mailer = TemplateMailer::new(
        renderer,
        transport,
        settings.email.default_from_email.clone(),
    );
    AccountMailer::new(mailer, config)
}

pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let allowed_origins: Vec<http::HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
}

/// Full application router
pub fn build_app<R, M>(state: UsersAppState<R, M>, cors: CorsLayer) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .merge(users_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
