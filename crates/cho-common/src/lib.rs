//! CHO Common - Shared types and utilities
//!
//! This crate provides the foundational types used across all backend crates:
//! - Error types and error codes
//! - Clock abstraction
//! - Reporting period helpers
//! - Seeded reference data
//! - Request validation helpers

pub mod clock;
pub mod error;
pub mod period;
pub mod reference;
pub mod validation;

// Re-exports for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ChoError, ErrorCode, FieldErrors};
pub use period::ReportPeriod;
pub use validation::validate_request;

/// Name of the session cookie carrying the encrypted access token
pub const SESSION_COOKIE: &str = "cho_session";

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: u64 = 50;
