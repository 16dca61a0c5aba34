//! Shared Kernel
//!
//! Vocabulary shared by every crate in the workspace:
//! - Unified error type and result alias
//! - Typed identifiers
//! - Conversions from common library errors
//!
//! Only things with the same meaning in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
