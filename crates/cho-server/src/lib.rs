// City Health Office reporting backend: HTTP server library
// The binary in main.rs wires these modules together; integration tests
// build the same App from them.

pub mod api; // HTTP handlers
pub mod error; // Error to response mapping
pub mod metrics; // Metrics and observability
pub mod middleware; // HTTP middleware
pub mod model; // Configuration, app state and response envelope
pub mod secured; // Role checks for handlers
pub mod startup; // Logging, HTTP server, scheduler and shutdown

pub use secured::{Secured, SecuredBuilder};
