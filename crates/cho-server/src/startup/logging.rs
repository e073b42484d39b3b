//! File-based logging with per-component files.
//!
//! | Log File          | Component                     | Target Prefixes                     |
//! |-------------------|-------------------------------|-------------------------------------|
//! | cho.log           | Root logger (all components)  | (all)                               |
//! | auth.log          | Logins, tokens, accounts      | cho_auth, cho_server::middleware    |
//! | report.log        | Submission lifecycle          | cho_report::service                 |
//! | notice.log        | Pending report notices        | notice, cho_report::notice          |
//! | persistence.log   | Database access               | cho_persistence, sea_orm            |
//!
//! Log files are stored in `~/cho/logs` by default. Override with the
//! `CHO_LOG_DIR` environment variable or `cho.logs.path`.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

struct ComponentLogDef {
    file_name: &'static str,
    targets: &'static [&'static str],
}

const ROOT_LOG: &str = "cho.log";

const COMPONENT_LOGS: &[ComponentLogDef] = &[
    ComponentLogDef {
        file_name: "auth.log",
        targets: &["cho_auth", "cho_server::middleware"],
    },
    ComponentLogDef {
        file_name: "report.log",
        targets: &["cho_report::service"],
    },
    ComponentLogDef {
        file_name: "notice.log",
        targets: &["notice", "cho_report::notice", "cho_server::startup::scheduler"],
    },
    ComponentLogDef {
        file_name: "persistence.log",
        targets: &["cho_persistence", "cho_migration", "sea_orm"],
    },
];

/// Log rotation policy
#[derive(Debug, Clone, Copy)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging configuration for the entire application.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    pub console_level: Level,
    pub file_logging: bool,
    pub file_level: Level,
    pub rotation: LogRotation,
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/cho/logs", home))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            console_level: Level::INFO,
            file_logging: true,
            file_level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Create from application configuration. `CHO_LOG_DIR`, `CHO_LOG_LEVEL`
    /// and `CHO_LOG_FILE` take precedence when set.
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
    ) -> Self {
        let log_dir = std::env::var("CHO_LOG_DIR")
            .ok()
            .or(log_dir)
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        let level = std::env::var("CHO_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .or_else(|| level.parse().ok())
            .unwrap_or(Level::INFO);

        let file_logging = std::env::var("CHO_LOG_FILE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(file_logging);

        Self {
            log_dir,
            console_output,
            console_level: level,
            file_logging,
            file_level: level,
            rotation: LogRotation::Daily,
        }
    }
}

/// Keeps the non-blocking file writers alive; dropping it flushes them.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

/// Non-blocking writer for one rolling log file
fn file_writer(
    config: &LoggingConfig,
    file_name: &str,
    guards: &mut Vec<WorkerGuard>,
) -> tracing_appender::non_blocking::NonBlocking {
    let appender = RollingFileAppender::new(config.rotation.into(), &config.log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    guards.push(guard);
    writer
}

/// Initialize the console layer, `cho.log` and the component files.
///
/// `RUST_LOG` overrides the configured level for the console and root file.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
    }

    let mut guards: Vec<WorkerGuard> = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.console_level.to_string()));
        layers.push(Box::new(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_filter(filter),
        ));
    }

    if config.file_logging {
        let root_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.file_level.to_string()));
        let root_layer = fmt::layer()
            .with_writer(file_writer(config, ROOT_LOG, &mut guards))
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false)
            .with_filter(root_filter);
        layers.push(Box::new(root_layer));

        let level: LevelFilter = config.file_level.into();
        for component in COMPONENT_LOGS {
            let mut targets = Targets::new();
            for target in component.targets {
                targets = targets.with_target(*target, level);
            }
            let layer = fmt::layer()
                .with_writer(file_writer(config, component.file_name, &mut guards))
                .with_target(true)
                .with_ansi(false)
                .with_filter(targets);
            layers.push(Box::new(layer));
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(
            log_dir = %config.log_dir.display(),
            "File logging initialized: {} (root) + {} component log files",
            ROOT_LOG,
            COMPONENT_LOGS.len()
        );
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}
