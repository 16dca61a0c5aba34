//! Users (Accounts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - User entity, value objects, repository trait
//! - `application/` - Use cases, forms, token services, account emails
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, bearer middleware, router
//!
//! ## Features
//! - Email-identified custom user with first, last and middle name
//! - Registration with emailed activation link
//! - JWT login (access + refresh); unverified accounts get a fresh
//!   activation email instead of tokens
//! - Token refresh / verify, profile editing, password change and reset
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - HS256 JWTs, never issued to inactive accounts
//! - Activation and reset links signed with HMAC-SHA256 over the user's
//!   password hash, last login and email, so they expire on use

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::UsersConfig;
pub use application::emails::{AccountMailer, BUILTIN_TEMPLATES};
pub use error::{UsersError, UsersResult};
pub use infra::{InMemoryUserRepository, PgUserRepository};
pub use presentation::handlers::UsersAppState;
pub use presentation::router::users_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
