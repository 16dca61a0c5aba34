//! User Forms
//!
//! Validation for the account data entry points. Every field is optional at
//! the serde level so that a missing field is reported as a field error
//! rather than a body parse error.

use serde::Deserialize;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{
    email::Email,
    person_name::PersonName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{UsersError, UsersResult};

/// Profile fields shared by the creation and change forms
pub const USER_FORM_FIELDS: [&str; 4] = ["email", "first_name", "last_name", "middle_name"];

/// Registration form
#[derive(Debug, Default, Deserialize)]
pub struct UserCreationForm {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub password: Option<String>,
    /// Retyped password; checked only when present
    pub re_password: Option<String>,
}

impl UserCreationForm {
    /// Validate every field and hash the password
    pub fn validate(self, pepper: Option<&[u8]>) -> UsersResult<NewUser> {
        let email = Email::new(self.email.ok_or_else(|| UsersError::required("email"))?)?;
        let first_name = name_field("first_name", self.first_name)?;
        let last_name = name_field("last_name", self.last_name)?;
        let middle_name = name_field("middle_name", self.middle_name)?;

        let password = self.password.ok_or_else(|| UsersError::required("password"))?;
        if let Some(retyped) = &self.re_password {
            if retyped != &password {
                return Err(UsersError::validation(
                    "non_field_errors",
                    "The two password fields didn't match.",
                ));
            }
        }
        let raw = RawPassword::new("password", password)?;

        Ok(NewUser {
            email,
            first_name,
            last_name,
            middle_name,
            password: UserPassword::from_raw(&raw, pepper)?,
        })
    }
}

/// Profile edit form; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UserChangeForm {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
}

/// Validated profile edit
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub middle_name: Option<PersonName>,
}

impl UserChangeForm {
    pub fn validate(self) -> UsersResult<UserChanges> {
        Ok(UserChanges {
            email: self.email.map(Email::new).transpose()?,
            first_name: self
                .first_name
                .map(|v| PersonName::new("first_name", v))
                .transpose()?,
            last_name: self
                .last_name
                .map(|v| PersonName::new("last_name", v))
                .transpose()?,
            middle_name: self
                .middle_name
                .map(|v| PersonName::new("middle_name", v))
                .transpose()?,
        })
    }
}

impl UserChanges {
    /// Apply to `user`; returns whether the email changed
    pub fn apply_to(self, user: &mut User) -> bool {
        let mut email_changed = false;
        if let Some(email) = self.email {
            email_changed = email != user.email;
            user.email = email;
        }
        if let Some(name) = self.first_name {
            user.first_name = name;
        }
        if let Some(name) = self.last_name {
            user.last_name = name;
        }
        if let Some(name) = self.middle_name {
            user.middle_name = name;
        }
        user.updated_at = chrono::Utc::now();
        email_changed
    }
}

/// Single-address form used before any account email is sent
#[derive(Debug, Default, Deserialize)]
pub struct SendEmailResetForm {
    pub email: Option<String>,
}

impl SendEmailResetForm {
    pub fn for_user(user: &User) -> Self {
        Self {
            email: Some(user.email.to_string()),
        }
    }

    pub fn validate(self) -> UsersResult<Email> {
        Email::new(self.email.ok_or_else(|| UsersError::required("email"))?)
    }
}

fn name_field(field: &'static str, value: Option<String>) -> UsersResult<PersonName> {
    match value {
        Some(v) => PersonName::new(field, v),
        None => Ok(PersonName::blank()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creation_form() -> UserCreationForm {
        UserCreationForm {
            email: Some("New@User.com".into()),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            middle_name: None,
            password: Some("Sturdy#Lamp42".into()),
            re_password: Some("Sturdy#Lamp42".into()),
        }
    }

    fn field_of(err: UsersError) -> String {
        match err {
            UsersError::Validation { field, .. } => field.into_owned(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_field_set() {
        assert_eq!(USER_FORM_FIELDS, ["email", "first_name", "last_name", "middle_name"]);
    }

    #[test]
    fn test_creation_form_valid() {
        let new_user = creation_form().validate(None).unwrap();
        assert_eq!(new_user.email.as_str(), "new@user.com");
        assert_eq!(new_user.first_name.as_str(), "Ada");
        assert!(new_user.middle_name.is_blank());
        assert!(
            new_user
                .password
                .verify(&RawPassword::for_verification("Sturdy#Lamp42".into()), None)
        );
    }

    #[test]
    fn test_creation_form_required_fields() {
        let form = UserCreationForm {
            email: None,
            ..creation_form()
        };
        assert_eq!(field_of(form.validate(None).unwrap_err()), "email");

        let form = UserCreationForm {
            password: None,
            ..creation_form()
        };
        assert_eq!(field_of(form.validate(None).unwrap_err()), "password");
    }

    #[test]
    fn test_creation_form_password_checks() {
        let form = UserCreationForm {
            re_password: Some("Different#Lamp42".into()),
            ..creation_form()
        };
        assert_eq!(field_of(form.validate(None).unwrap_err()), "non_field_errors");

        let form = UserCreationForm {
            password: Some("short".into()),
            re_password: None,
            ..creation_form()
        };
        assert_eq!(field_of(form.validate(None).unwrap_err()), "password");
    }

    #[test]
    fn test_change_form_partial() {
        let mut user = User::new(creation_form().validate(None).unwrap(), true);
        let changes = UserChangeForm {
            middle_name: Some(" Byron ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert!(!changes.apply_to(&mut user));
        assert_eq!(user.middle_name.as_str(), "Byron");
        assert_eq!(user.first_name.as_str(), "Ada");
        assert_eq!(user.email.as_str(), "new@user.com");
    }

    #[test]
    fn test_change_form_detects_email_change() {
        let mut user = User::new(creation_form().validate(None).unwrap(), true);
        let same = UserChangeForm {
            email: Some("NEW@user.com".into()),
            ..Default::default()
        };
        assert!(!same.validate().unwrap().apply_to(&mut user));

        let other = UserChangeForm {
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        assert!(other.validate().unwrap().apply_to(&mut user));
    }

    #[test]
    fn test_change_form_invalid_is_all_or_nothing() {
        let form = UserChangeForm {
            first_name: Some("Grace".into()),
            email: Some("broken".into()),
            ..Default::default()
        };
        assert_eq!(field_of(form.validate().unwrap_err()), "email");
    }

    #[test]
    fn test_send_email_reset_form() {
        assert_eq!(
            SendEmailResetForm {
                email: Some("A@B.co".into())
            }
            .validate()
            .unwrap()
            .as_str(),
            "a@b.co"
        );
        assert_eq!(field_of(SendEmailResetForm::default().validate().unwrap_err()), "email");
    }
}
