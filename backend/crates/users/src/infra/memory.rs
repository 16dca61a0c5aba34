//! In-Memory Repository Implementation
//!
//! Process-local store for tests and database-less development runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{UsersError, UsersResult};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> UsersResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(UsersError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> UsersResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> UsersResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == *email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> UsersResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == *email))
    }

    async fn update(&self, user: &User) -> UsersResult<()> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == user.email && u.user_id != user.user_id)
        {
            return Err(UsersError::EmailTaken);
        }
        match users.get_mut(&user.user_id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(UsersError::Internal(format!(
                "Cannot update missing user {}",
                user.user_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::NewUser;
    use crate::domain::value_object::{
        person_name::PersonName,
        user_password::{RawPassword, UserPassword},
    };

    fn user(email: &str) -> User {
        let raw = RawPassword::new("password", "Sturdy#Lamp42".to_string()).unwrap();
        User::new(
            NewUser {
                email: Email::new(email).unwrap(),
                first_name: PersonName::blank(),
                last_name: PersonName::blank(),
                middle_name: PersonName::blank(),
                password: UserPassword::from_raw(&raw, None).unwrap(),
            },
            true,
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryUserRepository::new();
        let ada = user("ada@example.com");
        repo.create(&ada).await.unwrap();

        let by_id = repo.find_by_id(&ada.user_id).await.unwrap().unwrap();
        assert_eq!(by_id.email, ada.email);
        let by_email = repo.find_by_email(&ada.email).await.unwrap().unwrap();
        assert_eq!(by_email.user_id, ada.user_id);
        assert!(repo.exists_by_email(&ada.email).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(&user("ada@example.com")).await.unwrap();

        let err = repo.create(&user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, UsersError::EmailTaken));
        assert_eq!(repo.users.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_cannot_steal_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(&user("ada@example.com")).await.unwrap();
        let mut grace = user("grace@example.com");
        repo.create(&grace).await.unwrap();

        grace.email = Email::new("ada@example.com").unwrap();
        let err = repo.update(&grace).await.unwrap_err();
        assert!(matches!(err, UsersError::EmailTaken));
    }
}
