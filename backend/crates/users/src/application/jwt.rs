//! JWT Token Service
//!
//! HS256 access/refresh pair. Claims: `token_type`, `exp`, `iat`, `jti`,
//! `user_id`.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::application::config::UsersConfig;
use crate::domain::value_object::user_id::UserId;
use crate::error::{UsersError, UsersResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub user_id: String,
}

impl Claims {
    pub fn user_id(&self) -> UsersResult<UserId> {
        UserId::parse_str(&self.user_id).map_err(|_| UsersError::InvalidToken)
    }
}

/// Access + refresh bundle returned by the login endpoints
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &UsersConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret_key),
            decoding_key: DecodingKey::from_secret(&config.secret_key),
            validation,
            access_lifetime: config.access_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
        }
    }

    pub fn issue_pair(&self, user_id: &UserId) -> UsersResult<TokenPair> {
        Ok(TokenPair {
            refresh: self.issue(user_id, TokenType::Refresh)?,
            access: self.issue(user_id, TokenType::Access)?,
        })
    }

    pub fn issue(&self, user_id: &UserId, token_type: TokenType) -> UsersResult<String> {
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let iat = Utc::now().timestamp();
        let claims = Claims {
            token_type,
            exp: iat + lifetime.as_secs() as i64,
            iat,
            jti: Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| UsersError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate signature and expiry
    ///
    /// With `expected` set, a token of the other type is rejected too.
    pub fn decode(&self, token: &str, expected: Option<TokenType>) -> UsersResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT rejected");
                UsersError::InvalidToken
            })?
            .claims;

        match expected {
            Some(token_type) if claims.token_type != token_type => Err(UsersError::InvalidToken),
            _ => Ok(claims),
        }
    }
}
