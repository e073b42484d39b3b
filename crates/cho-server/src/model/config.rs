//! Configuration management for the CHO server
//!
//! Values come from `conf/application.yml`, then environment variables such
//! as `CHO__SERVER__PORT` (for `cho.server.port`), then command line overrides.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use config::{Config, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use cho_auth::model::{
    COOKIE_SECRET_KEY, COOKIE_SECURE, DEFAULT_TOKEN_EXPIRE_SECONDS, TOKEN_EXPIRE_SECONDS,
    TOKEN_SECRET_KEY,
};
use cho_persistence::model::StorageMode;
use cho_report::notice::DEFAULT_LEAD_DAYS;

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_CONTEXT_PATH: &str = "/api";
pub const DEFAULT_NOTICE_TIMES: [&str; 2] = ["06:00", "18:00"];

const SERVER_ADDRESS: &str = "cho.server.address";
const SERVER_PORT: &str = "cho.server.port";
const SERVER_CONTEXT_PATH: &str = "cho.server.contextPath";
const SERVER_SHUTDOWN_TIMEOUT: &str = "cho.server.shutdownTimeout";
const STORAGE: &str = "cho.storage";
const DB_URL: &str = "db.url";
const ADMIN_NAME: &str = "cho.auth.admin.name";
const ADMIN_EMAIL: &str = "cho.auth.admin.email";
const ADMIN_PASSWORD: &str = "cho.auth.admin.password";
const NOTICE_SENDER: &str = "cho.notice.sender";
const NOTICE_LEAD_DAYS: &str = "cho.notice.leadDays";
const NOTICE_SCHEDULER_ENABLED: &str = "cho.notice.scheduler.enabled";
const NOTICE_SCHEDULER_TIMES: &str = "cho.notice.scheduler.times";
const NOTICE_WEBHOOK_URL: &str = "cho.notice.webhook.url";
const NOTICE_WEBHOOK_SECRET: &str = "cho.notice.webhook.secret";
const NOTICE_WEBHOOK_TIMEOUT_MS: &str = "cho.notice.webhook.timeoutMs";

/// Command line of the `cho-server` binary
#[derive(Debug, Parser)]
#[command(name = "cho-server", version, about = "City Health Office reporting backend")]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,
    #[arg(long = "db-url", env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
    /// `sql` or `memory`
    #[arg(long = "storage", global = true)]
    pub storage: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Send pending report notices once and exit
    Notice {
        /// Only submissions due soon or already overdue
        #[arg(long)]
        check: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Create the bootstrap admin account, or reset its password
    SeedAdmin {
        #[arg(long, default_value = "Administrator")]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CHO_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Which channel the notice job delivers through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeSenderKind {
    Log,
    Webhook {
        url: String,
        secret: Option<String>,
        timeout: Duration,
    },
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            .add_source(config::File::from(cli.config_file.as_path()).required(false))
            .add_source(
                Environment::with_prefix("CHO")
                    .prefix_separator("__")
                    .separator("__")
                    .keep_prefix(true)
                    .try_parsing(true),
            );

        if let Some(v) = &cli.database_url {
            builder = builder.set_override(DB_URL, v.as_str())?;
        }
        if let Some(v) = &cli.storage {
            builder = builder.set_override(STORAGE, v.as_str())?;
        }

        Ok(Self::from_config(builder.build()?))
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string(SERVER_ADDRESS)
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int(SERVER_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Always starts with `/` and never ends with one
    pub fn server_context_path(&self) -> String {
        let path = self
            .config
            .get_string(SERVER_CONTEXT_PATH)
            .unwrap_or(DEFAULT_CONTEXT_PATH.to_string());
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn shutdown_timeout(&self) -> u64 {
        self.config
            .get_int(SERVER_SHUTDOWN_TIMEOUT)
            .unwrap_or(30)
            .max(0) as u64
    }

    // ========================================================================
    // Storage
    // ========================================================================

    pub fn storage_mode(&self) -> anyhow::Result<StorageMode> {
        match self.config.get_string(STORAGE) {
            Ok(v) => v
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown storage mode '{}', expected sql or memory", v)),
            Err(_) => Ok(StorageMode::Sql),
        }
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let max_connections = self.config.get_int("db.pool.maxConnections").unwrap_or(20) as u32;
        let min_connections = self.config.get_int("db.pool.minConnections").unwrap_or(1) as u32;
        let connect_timeout = self.config.get_int("db.pool.connectTimeout").unwrap_or(30) as u64;
        let acquire_timeout = self.config.get_int("db.pool.acquireTimeout").unwrap_or(8) as u64;
        let idle_timeout = self.config.get_int("db.pool.idleTimeout").unwrap_or(600) as u64;
        let max_lifetime = self.config.get_int("db.pool.maxLifetime").unwrap_or(1800) as u64;
        let sqlx_logging = self.config.get_bool("db.pool.sqlxLogging").unwrap_or(false);

        let url = self
            .config
            .get_string(DB_URL)
            .map_err(|_| anyhow::anyhow!("db.url is not configured (set --db-url or DATABASE_URL)"))?;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .sqlx_logging(sqlx_logging);

        tracing::info!(
            max_connections,
            min_connections,
            connect_timeout,
            idle_timeout,
            max_lifetime,
            "Database connection pool configured"
        );

        Ok(Database::connect(opt).await?)
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub fn token_secret_key(&self) -> String {
        self.config.get_string(TOKEN_SECRET_KEY).unwrap_or_default()
    }

    pub fn token_expire_seconds(&self) -> i64 {
        self.config
            .get_int(TOKEN_EXPIRE_SECONDS)
            .unwrap_or(DEFAULT_TOKEN_EXPIRE_SECONDS)
    }

    /// Falls back to the token secret
    pub fn cookie_secret_key(&self) -> String {
        self.config
            .get_string(COOKIE_SECRET_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.token_secret_key())
    }

    pub fn cookie_secure(&self) -> bool {
        self.config.get_bool(COOKIE_SECURE).unwrap_or(false)
    }

    /// Admin account created at startup when `cho.auth.admin.email` and
    /// `cho.auth.admin.password` are both set. Mainly for the memory backend,
    /// which starts empty on every run.
    pub fn bootstrap_admin(&self) -> Option<(String, String, String)> {
        let email = self.config.get_string(ADMIN_EMAIL).ok().filter(|v| !v.trim().is_empty())?;
        let password = self.config.get_string(ADMIN_PASSWORD).ok().filter(|v| !v.is_empty())?;
        let name = self
            .config
            .get_string(ADMIN_NAME)
            .unwrap_or("Administrator".to_string());
        Some((name, email, password))
    }

    // ========================================================================
    // Notices
    // ========================================================================

    pub fn notice_lead_days(&self) -> i64 {
        self.config
            .get_int(NOTICE_LEAD_DAYS)
            .unwrap_or(DEFAULT_LEAD_DAYS)
            .max(0)
    }

    pub fn notice_sender(&self) -> anyhow::Result<NoticeSenderKind> {
        let kind = self
            .config
            .get_string(NOTICE_SENDER)
            .unwrap_or("log".to_string());
        match kind.trim() {
            "log" => Ok(NoticeSenderKind::Log),
            "webhook" => {
                let url = self
                    .config
                    .get_string(NOTICE_WEBHOOK_URL)
                    .map_err(|_| anyhow::anyhow!("{} is required for the webhook sender", NOTICE_WEBHOOK_URL))?;
                let secret = self
                    .config
                    .get_string(NOTICE_WEBHOOK_SECRET)
                    .ok()
                    .filter(|v| !v.is_empty());
                let timeout = self
                    .config
                    .get_int(NOTICE_WEBHOOK_TIMEOUT_MS)
                    .unwrap_or(5000)
                    .max(1) as u64;
                Ok(NoticeSenderKind::Webhook {
                    url,
                    secret,
                    timeout: Duration::from_millis(timeout),
                })
            }
            other => anyhow::bail!("unknown notice sender '{}', expected log or webhook", other),
        }
    }

    pub fn notice_scheduler_enabled(&self) -> bool {
        self.config
            .get_bool(NOTICE_SCHEDULER_ENABLED)
            .unwrap_or(true)
    }

    /// Local times of day at which the scheduler fires, sorted
    pub fn notice_scheduler_times(&self) -> anyhow::Result<Vec<NaiveTime>> {
        let raw: Vec<String> = match self.config.get_array(NOTICE_SCHEDULER_TIMES) {
            Ok(values) => values
                .into_iter()
                .map(|v| v.into_string())
                .collect::<Result<_, _>>()?,
            Err(_) => DEFAULT_NOTICE_TIMES.iter().map(|s| s.to_string()).collect(),
        };

        let mut times = raw
            .iter()
            .map(|v| {
                NaiveTime::parse_from_str(v.trim(), "%H:%M")
                    .map_err(|_| anyhow::anyhow!("invalid scheduler time '{}', expected HH:MM", v))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        times.sort();
        times.dedup();
        Ok(times)
    }

    // ========================================================================
    // Logging
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string("cho.logs.path").ok(),
            self.config.get_bool("cho.logs.console").unwrap_or(true),
            self.config.get_bool("cho.logs.file").unwrap_or(true),
            self.config
                .get_string("cho.logs.level")
                .unwrap_or("info".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(pairs: &[(&str, &str)]) -> Configuration {
        let mut builder = Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration::from_config(builder.build().unwrap())
    }

    #[test]
    fn test_defaults() {
        let configuration = configuration(&[]);
        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(configuration.server_context_path(), "/api");
        assert_eq!(configuration.storage_mode().unwrap(), StorageMode::Sql);
        assert_eq!(configuration.token_expire_seconds(), DEFAULT_TOKEN_EXPIRE_SECONDS);
        assert_eq!(configuration.notice_lead_days(), 3);
        assert_eq!(configuration.notice_sender().unwrap(), NoticeSenderKind::Log);
        assert!(configuration.notice_scheduler_enabled());
        assert!(!configuration.cookie_secure());
    }

    #[test]
    fn test_context_path_is_normalized() {
        assert_eq!(
            configuration(&[(SERVER_CONTEXT_PATH, "reports/")]).server_context_path(),
            "/reports"
        );
        assert_eq!(configuration(&[(SERVER_CONTEXT_PATH, "/")]).server_context_path(), "");
    }

    #[test]
    fn test_scheduler_times() {
        let times = configuration(&[]).notice_scheduler_times().unwrap();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap()
            ]
        );
    }

    #[test]
    fn test_cookie_secret_falls_back_to_token_secret() {
        let configuration = configuration(&[(TOKEN_SECRET_KEY, "abc")]);
        assert_eq!(configuration.cookie_secret_key(), "abc");
    }

    #[test]
    fn test_webhook_sender_requires_url() {
        assert!(configuration(&[(NOTICE_SENDER, "webhook")]).notice_sender().is_err());

        let sender = configuration(&[
            (NOTICE_SENDER, "webhook"),
            (NOTICE_WEBHOOK_URL, "http://relay.local/notices"),
            (NOTICE_WEBHOOK_SECRET, "s3cret"),
        ])
        .notice_sender()
        .unwrap();
        assert_eq!(
            sender,
            NoticeSenderKind::Webhook {
                url: "http://relay.local/notices".to_string(),
                secret: Some("s3cret".to_string()),
                timeout: Duration::from_millis(5000),
            }
        );
    }

    #[test]
    fn test_unknown_storage_mode_is_rejected() {
        assert!(configuration(&[(STORAGE, "rocksdb")]).storage_mode().is_err());
        assert_eq!(
            configuration(&[(STORAGE, "memory")]).storage_mode().unwrap(),
            StorageMode::Memory
        );
    }

    #[test]
    fn test_bootstrap_admin_needs_email_and_password() {
        assert!(configuration(&[(ADMIN_EMAIL, "admin@cho.gov.ph")]).bootstrap_admin().is_none());
        let admin = configuration(&[
            (ADMIN_EMAIL, "admin@cho.gov.ph"),
            (ADMIN_PASSWORD, "change-me-now"),
        ])
        .bootstrap_admin();
        assert_eq!(
            admin,
            Some((
                "Administrator".to_string(),
                "admin@cho.gov.ph".to_string(),
                "change-me-now".to_string()
            ))
        );
    }
}
