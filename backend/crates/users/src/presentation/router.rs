//! Users Router
//!
//! The custom login is matched first; everything else falls through to the
//! generic route groups mounted under `/auth`. The generic group keeps its
//! own `/auth/jwt/create/`, which is therefore never reached for POST.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use platform::mail::MailTransport;

use crate::domain::repository::UserRepository;
use crate::presentation::handlers::{self, UsersAppState};
use crate::presentation::middleware::require_access_token;

/// Route path of the custom login
pub const LOGIN_PATH: &str = "/auth/jwt/create/";

/// Create the full account router (custom login + generic groups)
pub fn users_router<R, M>(state: UsersAppState<R, M>) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let generic = Router::new().nest("/auth", account_routes(state.clone()));

    Router::new()
        .route(LOGIN_PATH, post(handlers::login::<R, M>))
        .with_state(state)
        .fallback_service(generic)
}

/// Generic `users` and `jwt` groups, relative to their mount point
pub fn account_routes<R, M>(state: UsersAppState<R, M>) -> Router
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let authenticated = Router::new()
        .route(
            "/users/me/",
            get(handlers::me)
                .put(handlers::update_me::<R, M>)
                .patch(handlers::update_me::<R, M>),
        )
        .route("/users/set_password/", post(handlers::set_password::<R, M>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<R, M>,
        ));

    let users = Router::new()
        .route("/users/", post(handlers::register::<R, M>))
        .route("/users/activation/", post(handlers::activation::<R, M>))
        .route(
            "/users/resend_activation/",
            post(handlers::resend_activation::<R, M>),
        )
        .route("/users/reset_password/", post(handlers::reset_password::<R, M>))
        .route(
            "/users/reset_password_confirm/",
            post(handlers::reset_password_confirm::<R, M>),
        );

    let jwt = Router::new()
        .route("/jwt/create/", post(handlers::token_obtain::<R, M>))
        .route("/jwt/refresh/", post(handlers::token_refresh::<R, M>))
        .route("/jwt/verify/", post(handlers::token_verify::<R, M>));

    authenticated.merge(users).merge(jwt).with_state(state)
}
