//! User Entity
//!
//! Custom account model: the email address is the unique identifier and
//! there is no separate user name.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, person_name::PersonName, user_id::UserId, user_password::UserPassword,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, lowercased
    pub email: Email,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub middle_name: PersonName,
    pub password: UserPassword,
    /// Activation flag; no tokens are issued while false
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Validated registration data
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub middle_name: PersonName,
    pub password: UserPassword,
}

impl User {
    /// Create a user from registration data
    pub fn new(new_user: NewUser, is_active: bool) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            middle_name: new_user.middle_name,
            password: new_user.password,
            is_active,
            is_staff: false,
            date_joined: now,
            last_login: None,
            updated_at: now,
        }
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    pub fn set_password(&mut self, password: UserPassword) {
        self.password = password;
        self.updated_at = Utc::now();
    }

    /// "First Middle Last", skipping blank parts
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|n| !n.is_blank())
            .map(PersonName::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn new_user() -> NewUser {
        let raw = RawPassword::new("password", "Sturdy#Lamp42".to_string()).unwrap();
        NewUser {
            email: Email::new("ada@example.com").unwrap(),
            first_name: PersonName::new("first_name", "Ada").unwrap(),
            last_name: PersonName::new("last_name", "Lovelace").unwrap(),
            middle_name: PersonName::blank(),
            password: UserPassword::from_raw(&raw, None).unwrap(),
        }
    }

    #[test]
    fn test_new_user_inactive() {
        let user = User::new(new_user(), false);
        assert!(!user.is_active);
        assert!(!user.is_staff);
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_activate() {
        let mut user = User::new(new_user(), false);
        user.activate();
        assert!(user.is_active);
        user.deactivate();
        assert!(!user.is_active);
    }

    #[test]
    fn test_full_name_skips_blank_parts() {
        let user = User::new(new_user(), true);
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
