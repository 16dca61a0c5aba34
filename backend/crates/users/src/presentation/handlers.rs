//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

use platform::mail::MailTransport;
use platform::site::RequestSite;

use crate::application::config::UsersConfig;
use crate::application::emails::AccountMailer;
use crate::application::forms::{SendEmailResetForm, UserChangeForm, UserCreationForm};
use crate::application::jwt::{TokenPair, TokenService};
use crate::application::{
    AccessToken, ActivateUseCase, LoginUseCase, PasswordUseCase, RegisterUseCase,
    ResendActivationUseCase, ResetConfirmInput, TokenObtainUseCase, TokenRefreshUseCase,
    TokenVerifyUseCase, UidAndToken, UpdateProfileUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::UsersResult;
use crate::presentation::dto::{
    ActivationRequest, JsonBody, PasswordResetConfirmRequest, SetPasswordRequest,
    TokenObtainRequest, TokenRefreshRequest, TokenVerifyRequest, TokenVerifyResponse, UserResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for users handlers
pub struct UsersAppState<R, M> {
    pub repo: Arc<R>,
    pub mailer: Arc<AccountMailer<M>>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<UsersConfig>,
}

// Manual impl: a derive would require `R: Clone` and `M: Clone`.
impl<R, M> Clone for UsersAppState<R, M> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, M> UsersAppState<R, M> {
    pub fn new(repo: R, mailer: AccountMailer<M>, config: Arc<UsersConfig>) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            tokens: Arc::new(TokenService::new(&config)),
            config,
        }
    }

    /// Scheme and host for links in outgoing email
    fn site(&self, headers: &HeaderMap) -> RequestSite {
        RequestSite::from_headers(headers, &self.config.site_policy())
    }
}

// ============================================================================
// JWT
// ============================================================================

/// POST /auth/jwt/create/ (custom)
///
/// Refuses unverified accounts after re-sending their activation email.
pub async fn login<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<TokenObtainRequest>,
) -> UsersResult<Json<TokenPair>>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let pair = use_case.execute(&site, req.into()).await?;

    Ok(Json(pair))
}

/// POST /auth/jwt/create/ (standard)
pub async fn token_obtain<R, M>(
    State(state): State<UsersAppState<R, M>>,
    JsonBody(req): JsonBody<TokenObtainRequest>,
) -> UsersResult<Json<TokenPair>>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let use_case =
        TokenObtainUseCase::new(state.repo.clone(), state.tokens.clone(), state.config.clone());

    Ok(Json(use_case.execute(req.into()).await?))
}

/// POST /auth/jwt/refresh/
pub async fn token_refresh<R, M>(
    State(state): State<UsersAppState<R, M>>,
    JsonBody(req): JsonBody<TokenRefreshRequest>,
) -> UsersResult<Json<AccessToken>>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let use_case = TokenRefreshUseCase::new(state.repo.clone(), state.tokens.clone());

    Ok(Json(use_case.execute(req.refresh).await?))
}

/// POST /auth/jwt/verify/
pub async fn token_verify<R, M>(
    State(state): State<UsersAppState<R, M>>,
    JsonBody(req): JsonBody<TokenVerifyRequest>,
) -> UsersResult<Json<TokenVerifyResponse>>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    TokenVerifyUseCase::new(state.tokens.clone()).execute(req.token)?;

    Ok(Json(TokenVerifyResponse {}))
}

// ============================================================================
// Users
// ============================================================================

/// POST /auth/users/
pub async fn register<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(form): JsonBody<UserCreationForm>,
) -> UsersResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        RegisterUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    let user = use_case.execute(&site, form).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/users/activation/
pub async fn activation<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<ActivationRequest>,
) -> UsersResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        ActivateUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    use_case.execute(&site, req.into()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/users/resend_activation/
pub async fn resend_activation<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(form): JsonBody<SendEmailResetForm>,
) -> UsersResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        ResendActivationUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    use_case.execute(&site, form).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/users/me/
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PUT|PATCH /auth/users/me/
pub async fn update_me<R, M>(
    State(state): State<UsersAppState<R, M>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    JsonBody(form): JsonBody<UserChangeForm>,
) -> UsersResult<Json<UserResponse>>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        UpdateProfileUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    let user = use_case.execute(&site, user, form).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /auth/users/set_password/
pub async fn set_password<R, M>(
    State(state): State<UsersAppState<R, M>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<SetPasswordRequest>,
) -> UsersResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        PasswordUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    use_case.set_password(&site, user, req.into()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/users/reset_password/
pub async fn reset_password<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(form): JsonBody<SendEmailResetForm>,
) -> UsersResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        PasswordUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    use_case.request_reset(&site, form).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/users/reset_password_confirm/
pub async fn reset_password_confirm<R, M>(
    State(state): State<UsersAppState<R, M>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<PasswordResetConfirmRequest>,
) -> UsersResult<StatusCode>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let site = state.site(&headers);
    let use_case =
        PasswordUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    let input = ResetConfirmInput {
        link: UidAndToken {
            uid: req.uid,
            token: req.token,
        },
        new_password: req.new_password,
        re_new_password: req.re_new_password,
    };
    use_case.confirm_reset(&site, input).await?;

    Ok(StatusCode::NO_CONTENT)
}
