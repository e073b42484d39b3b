//! CHO Auth - Authentication, sessions and accounts
//!
//! This crate provides:
//! - JWT token handling backed by personal access token rows
//! - Password hashing
//! - Encrypted session cookies
//! - Principal and role scoping rules
//! - User account management

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::*;
pub use service::login::{AuthService, AuthSettings};
pub use service::session::SessionCipher;
pub use service::user::UserService;
