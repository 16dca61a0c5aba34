//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: maps policy violations to
//! field-level validation errors and keeps the hash opaque.
//!
//! ## Usage
//! ```rust
//! use users::domain::value_object::user_password::{RawPassword, UserPassword};
//!
//! let raw = RawPassword::new("password", "MySecure#Pass2024".to_string()).unwrap();
//! let hashed = UserPassword::from_raw(&raw, None).unwrap();
//!
//! let login = RawPassword::for_verification("MySecure#Pass2024".to_string());
//! assert!(hashed.verify(&login, None));
//! ```

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{UsersError, UsersResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a newly chosen password
    ///
    /// ## Arguments
    /// * `field` - Form field the password came from (`password`, `new_password`)
    /// * `raw` - Submitted value
    pub fn new(field: &'static str, raw: String) -> UsersResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| {
            let message = match e {
                PasswordPolicyError::TooShort { min, .. } => format!(
                    "This password is too short. It must contain at least {} characters.",
                    min
                ),
                PasswordPolicyError::TooLong { max, .. } => format!(
                    "This password is too long. It must contain at most {} characters.",
                    max
                ),
                PasswordPolicyError::EmptyOrWhitespace => "This field may not be blank.".to_string(),
                PasswordPolicyError::InvalidCharacter => {
                    "This password contains invalid characters.".to_string()
                }
                PasswordPolicyError::CommonPattern => "This password is too common.".to_string(),
            };
            UsersError::validation(field, message)
        })?;

        Ok(Self(clear_text))
    }

    /// Wrap a submitted password for comparison only (no policy)
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a validated raw password
    ///
    /// ## Arguments
    /// * `raw` - The raw password
    /// * `pepper` - Optional application-wide secret
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> UsersResult<Self> {
        let hashed = raw
            .inner()
            .hash(pepper)
            .map_err(|e| UsersError::Internal(e.to_string()))?;

        Ok(Self(hashed))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> UsersResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| UsersError::Internal("Invalid password hash in database".to_string()))?;

        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    ///
    /// `pepper` must match the one used during hashing.
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
