//! Entry point of the `cho-server` binary.
//!
//! `serve` (the default) runs the HTTP server and the notice scheduler;
//! `notice`, `migrate` and `seed-admin` are one-shot commands for cron and
//! deployment scripts.

use std::sync::Arc;

use clap::Parser;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use cho_auth::UserService;
use cho_common::{Clock, SystemClock};
use cho_migration::Migrator;
use cho_persistence::model::StorageMode;
use cho_persistence::{ExternalDbPersistService, MemoryPersistService, PersistenceService};
use cho_server::{
    metrics,
    model::{AppState, Cli, Command, Configuration},
    startup,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let configuration = Configuration::new(&cli)?;

    let logging_config = configuration.logging_config();
    let _logging_guard = startup::init_logging(&logging_config)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(configuration, clock).await,
        Command::Notice { check } => notice(configuration, clock, check).await,
        Command::Migrate => migrate(&configuration).await,
        Command::SeedAdmin {
            name,
            email,
            password,
        } => {
            let persistence = persistence(&configuration, clock.as_ref()).await?;
            let user = UserService::new(persistence, clock)
                .seed_admin(&name, &email, &password)
                .await?;
            info!(user_id = user.id, email = %user.email, "Admin account ready");
            Ok(())
        }
    }
}

async fn persistence(
    configuration: &Configuration,
    clock: &dyn Clock,
) -> anyhow::Result<Arc<dyn PersistenceService>> {
    let storage_mode = configuration.storage_mode()?;
    info!("Persistence mode: {}", storage_mode);

    Ok(match storage_mode {
        StorageMode::Sql => Arc::new(ExternalDbPersistService::new(
            configuration.database_connection().await?,
        )),
        StorageMode::Memory => {
            warn!("Memory storage selected, data is lost when the process exits");
            Arc::new(MemoryPersistService::seeded(clock.now()))
        }
    })
}

async fn serve(configuration: Configuration, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    let handle = metrics::install_recorder()?;
    metrics::init_metrics();

    let persistence = persistence(&configuration, clock.as_ref()).await?;

    if let Some((name, email, password)) = configuration.bootstrap_admin() {
        let user = UserService::new(persistence.clone(), clock.clone())
            .seed_admin(&name, &email, &password)
            .await?;
        info!(user_id = user.id, "Bootstrap admin account ready");
    }

    let app_state = Arc::new(AppState::new(configuration, persistence, clock)?.with_metrics(handle));

    let shutdown = startup::wait_for_shutdown_signal();

    let scheduler = if app_state.configuration.notice_scheduler_enabled() {
        startup::start_notice_scheduler(
            app_state.notice.clone(),
            app_state.configuration.notice_scheduler_times()?,
            shutdown.clone(),
        )
    } else {
        info!("Notice scheduler is disabled");
        None
    };

    let server = startup::main_server(app_state.clone())?;
    let server_handle = server.handle();
    let mut shutdown_rx = shutdown.subscribe();
    actix_rt::spawn(async move {
        let _ = shutdown_rx.recv().await;
        info!("HTTP server shutting down gracefully");
        server_handle.stop(true).await;
    });

    if let Err(e) = server.await {
        error!("HTTP server error: {}", e);
    }

    // stops the scheduler when the server exits on its own
    shutdown.shutdown();
    if let Some(task) = scheduler
        && let Err(e) = task.await
    {
        warn!("Notice scheduler task ended abnormally: {}", e);
    }

    info!("CHO server shutdown complete");
    Ok(())
}

async fn notice(
    configuration: Configuration,
    clock: Arc<dyn Clock>,
    check: bool,
) -> anyhow::Result<()> {
    let persistence = persistence(&configuration, clock.as_ref()).await?;
    let app_state = AppState::new(configuration, persistence, clock)?;
    let summary = app_state.notice.run(check).await?;
    info!(
        check,
        pending = summary.pending,
        sent = summary.notices_sent,
        failed = summary.notices_failed,
        "Notice run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn migrate(configuration: &Configuration) -> anyhow::Result<()> {
    let db = configuration.database_connection().await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");
    Ok(())
}
