//! Application startup utilities module.

mod http;
mod logging;
pub mod scheduler;
mod shutdown;

pub use http::{configure, main_server};
pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use scheduler::start_notice_scheduler;
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
