pub mod app_state;
pub mod config;
pub mod response;

pub use app_state::AppState;
pub use config::{Cli, Command, Configuration, NoticeSenderKind};
pub use response::Result;
