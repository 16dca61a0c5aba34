//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infrastructure layer.

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::UsersResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    ///
    /// Fails with `UsersError::EmailTaken` if the email is already registered.
    async fn create(&self, user: &User) -> UsersResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> UsersResult<Option<User>>;

    /// Find user by (normalized) email
    async fn find_by_email(&self, email: &Email) -> UsersResult<Option<User>>;

    /// Check if email is registered
    async fn exists_by_email(&self, email: &Email) -> UsersResult<bool>;

    /// Update every mutable column of an existing user
    async fn update(&self, user: &User) -> UsersResult<()>;
}
