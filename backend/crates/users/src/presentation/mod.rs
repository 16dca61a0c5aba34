//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::UsersAppState;
pub use middleware::{CurrentUser, require_access_token};
pub use router::{LOGIN_PATH, account_routes, users_router};
