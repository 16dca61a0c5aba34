//! Person Name Value Object
//!
//! First, last and middle names. Free text, trimmed, may be blank.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{UsersError, UsersResult};

/// Maximum length of each name part (in characters)
pub const PERSON_NAME_MAX_LENGTH: usize = 150;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    /// Validate a name part
    ///
    /// ## Arguments
    /// * `field` - Form field name, reported on validation failure
    /// * `raw` - Submitted value
    pub fn new(field: &'static str, raw: impl AsRef<str>) -> UsersResult<Self> {
        let value = raw.as_ref().trim();

        if value.chars().count() > PERSON_NAME_MAX_LENGTH {
            return Err(UsersError::validation(
                field,
                format!(
                    "Ensure this field has no more than {} characters.",
                    PERSON_NAME_MAX_LENGTH
                ),
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(UsersError::validation(field, "Enter a valid name."));
        }

        Ok(Self(value.to_string()))
    }

    pub fn blank() -> Self {
        Self::default()
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_allows_blank() {
        assert_eq!(PersonName::new("first_name", "  Ada ").unwrap().as_str(), "Ada");
        assert!(PersonName::new("middle_name", "   ").unwrap().is_blank());
    }

    #[test]
    fn test_length_limit_in_characters() {
        assert!(PersonName::new("last_name", "é".repeat(PERSON_NAME_MAX_LENGTH)).is_ok());
        let err = PersonName::new("last_name", "x".repeat(PERSON_NAME_MAX_LENGTH + 1)).unwrap_err();
        assert!(matches!(err, UsersError::Validation { field, .. } if field == "last_name"));
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(PersonName::new("first_name", "Ada\u{0007}").is_err());
    }
}
