//! Account Tokens
//!
//! One-time `uid`/`token` pairs embedded in activation and password-reset
//! links. Nothing is stored: the token is an HMAC over user state, so it
//! stops verifying once the password, last login or email changes, or when
//! it is older than the configured timeout.
//!
//! Format: `<issued-at seconds, base36>-<base64url HMAC-SHA256>`

use chrono::Utc;
use platform::crypto::{constant_time_eq, from_base64url, hmac_sha256, sha256, to_base64url};
use std::time::Duration;

use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;

const KEY_SALT: &[u8] = b"users.account_token";

/// Longest base36 timestamp accepted (u64::MAX is 13 digits)
const MAX_TIMESTAMP_DIGITS: usize = 13;

#[derive(Clone)]
pub struct AccountTokenGenerator {
    key: [u8; 32],
    timeout: Duration,
}

impl AccountTokenGenerator {
    pub fn new(secret: &[u8], timeout: Duration) -> Self {
        Self {
            key: sha256(&[KEY_SALT, secret].concat()),
            timeout,
        }
    }

    pub fn make_token(&self, user: &User) -> String {
        self.make_token_at(user, now_secs())
    }

    pub fn check_token(&self, user: &User, token: &str) -> bool {
        self.check_token_at(user, token, now_secs())
    }

    fn make_token_at(&self, user: &User, timestamp: u64) -> String {
        format!(
            "{}-{}",
            to_base36(timestamp),
            to_base64url(&self.signature(user, timestamp))
        )
    }

    fn check_token_at(&self, user: &User, token: &str, now: u64) -> bool {
        let Some((ts_b36, sig_b64)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(ts_b36) else {
            return false;
        };
        let Ok(signature) = from_base64url(sig_b64) else {
            return false;
        };

        if !constant_time_eq(&signature, &self.signature(user, timestamp)) {
            return false;
        }

        now.saturating_sub(timestamp) <= self.timeout.as_secs()
    }

    fn signature(&self, user: &User, timestamp: u64) -> [u8; 32] {
        let last_login = user
            .last_login
            .map(|t| t.timestamp_micros().to_string())
            .unwrap_or_default();
        let value = format!(
            "{}\0{}\0{}\0{}\0{}",
            user.user_id,
            user.password.as_phc_string(),
            last_login,
            timestamp,
            user.email
        );
        hmac_sha256(&self.key, value.as_bytes())
    }
}

/// Encode a user id for use in a link
pub fn encode_uid(user_id: &UserId) -> String {
    to_base64url(user_id.to_string().as_bytes())
}

/// Decode a link uid; `None` for anything malformed
pub fn decode_uid(uid: &str) -> Option<UserId> {
    let bytes = from_base64url(uid).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    UserId::parse_str(text).ok()
}

fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > MAX_TIMESTAMP_DIGITS {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::NewUser;
    use crate::domain::value_object::{
        email::Email,
        person_name::PersonName,
        user_password::{RawPassword, UserPassword},
    };

    const DAY: u64 = 24 * 3600;

    fn user() -> User {
        let raw = RawPassword::new("password", "Sturdy#Lamp42".to_string()).unwrap();
        User::new(
            NewUser {
                email: Email::new("new@user.com").unwrap(),
                first_name: PersonName::blank(),
                last_name: PersonName::blank(),
                middle_name: PersonName::blank(),
                password: UserPassword::from_raw(&raw, None).unwrap(),
            },
            false,
        )
    }

    fn generator() -> AccountTokenGenerator {
        AccountTokenGenerator::new(b"secret", Duration::from_secs(3 * DAY))
    }

    #[test]
    fn test_token_verifies_for_same_user() {
        let user = user();
        let token = generator().make_token(&user);
        assert!(generator().check_token(&user, &token));
    }

    #[test]
    fn test_token_bound_to_user() {
        let token = generator().make_token(&user());
        assert!(!generator().check_token(&user(), &token));
    }

    #[test]
    fn test_token_expires() {
        let user = user();
        let issued = 1_700_000_000;
        let token = generator().make_token_at(&user, issued);
        assert!(generator().check_token_at(&user, &token, issued + 3 * DAY));
        assert!(!generator().check_token_at(&user, &token, issued + 3 * DAY + 1));
    }

    #[test]
    fn test_token_invalidated_by_state_change() {
        let mut user = user();
        let token = generator().make_token(&user);
        user.record_login();
        assert!(!generator().check_token(&user, &token));

        let mut user = self::user();
        let token = generator().make_token(&user);
        user.email = Email::new("other@user.com").unwrap();
        assert!(!generator().check_token(&user, &token));
    }

    #[test]
    fn test_token_survives_activation() {
        let mut user = user();
        let token = generator().make_token(&user);
        user.activate();
        assert!(generator().check_token(&user, &token));
    }

    #[test]
    fn test_other_secret_rejected() {
        let user = user();
        let token = generator().make_token(&user);
        let other = AccountTokenGenerator::new(b"other", Duration::from_secs(DAY));
        assert!(!other.check_token(&user, &token));
    }

    #[test]
    fn test_malformed_tokens() {
        let user = user();
        for token in ["", "abc", "-", "zzzzzzzzzzzzzz-AAAA", "1-!!!", "1-AAAA"] {
            assert!(!generator().check_token(&user, token), "{token:?}");
        }
    }

    #[test]
    fn test_uid_encoding() {
        let id = UserId::new();
        let uid = encode_uid(&id);
        assert!(!uid.contains('='));
        assert_eq!(decode_uid(&uid), Some(id));
        assert_eq!(decode_uid("not base64!"), None);
        assert_eq!(decode_uid(&to_base64url(b"not-a-uuid")), None);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(from_base36(&to_base36(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(from_base36("!"), None);
    }
}
