//! Bearer Middleware
//!
//! Guards routes that act on the authenticated user.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::mail::MailTransport;

use crate::application::jwt::TokenType;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};
use crate::presentation::handlers::UsersAppState;

/// Authenticated user, stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Middleware that requires a valid, unexpired access token of an active user
pub async fn require_access_token<R, M>(
    State(state): State<UsersAppState<R, M>>,
    mut req: Request,
    next: Next,
) -> UsersResult<Response>
where
    R: UserRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(UsersError::NotAuthenticated)?;
    let claims = state.tokens.decode(token, Some(TokenType::Access))?;

    let user = state
        .repo
        .find_by_id(&claims.user_id()?)
        .await?
        .filter(|u| u.is_active)
        .ok_or(UsersError::TokenUserInactive)?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
