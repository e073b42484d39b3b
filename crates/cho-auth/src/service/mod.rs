//! Authentication service implementations

pub mod login;
pub mod password;
pub mod session;
pub mod token;
pub mod user;
