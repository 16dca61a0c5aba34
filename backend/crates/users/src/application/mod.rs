//! Application Layer
//!
//! Use cases and application services.

pub mod account_token;
pub mod activation;
pub mod config;
pub mod current_user;
pub mod emails;
pub mod forms;
pub mod jwt;
pub mod login;
pub mod password;
pub mod register;
pub mod token_obtain;
pub mod token_refresh;

// Re-exports
pub use activation::{ActivateUseCase, ResendActivationUseCase, UidAndToken};
pub use config::UsersConfig;
pub use current_user::UpdateProfileUseCase;
pub use emails::{AccountEmail, AccountMailer, BUILTIN_TEMPLATES};
pub use jwt::{TokenPair, TokenService};
pub use login::LoginUseCase;
pub use password::{PasswordUseCase, ResetConfirmInput, SetPasswordInput};
pub use register::RegisterUseCase;
pub use token_obtain::{TokenObtainInput, TokenObtainUseCase};
pub use token_refresh::{AccessToken, TokenRefreshUseCase, TokenVerifyUseCase};
