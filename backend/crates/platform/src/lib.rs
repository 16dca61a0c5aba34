//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Request site detection (host / scheme from headers)
//! - HTML to plain text conversion
//! - Templated email sending (MiniJinja + SMTP)

pub mod crypto;
pub mod html;
pub mod mail;
pub mod password;
pub mod site;
