//! Server initialization and startup logic for JobHands.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use jobhands_api::{ApiServer, ApiServerConfig, ApiState};
use jobhands_config::{
    Config, ConfigLoader, ConfigValidator, LoggingConfig, SchedulerConfig, StoreBackend, StoreConfig,
};
use jobhands_control::{JobControlService, JobRegistry};
use jobhands_engine::{EngineConfig, SchedulerEngine};
use jobhands_store::{
    JobRecordStore, MemoryJobRecordStore, SqliteJobRecordStore, StoreError, TriggerType,
};

use crate::jobs::register_builtin_jobs;

/// Get the JobHands data directory.
fn jobhands_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("jobhands"))
        .unwrap_or_else(|| PathBuf::from(".jobhands"))
}

/// Initialize tracing with console and optional file output.
///
/// `RUST_LOG` overrides the configured level. When `directory` is set, log
/// files rotate daily and the last 30 are kept.
pub(crate) fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = match &config.directory {
        Some(directory) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(directory));
            std::fs::create_dir_all(&log_dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("jobhands")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes on drop and must live as long as the process.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let json_layer = config.json.then(|| fmt::layer().json().with_target(true));
    let text_layer = (!config.json).then(|| fmt::layer().with_target(true).with_ansi(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Map the `[scheduler]` section onto the engine configuration.
pub(crate) fn engine_config(config: &SchedulerConfig) -> EngineConfig {
    EngineConfig {
        max_workers: config.max_workers,
        misfire_threshold_ms: config.misfire_threshold_ms,
        idle_wait_ms: config.idle_wait_ms,
        event_history: config.event_history,
    }
}

/// Open the configured record store.
pub(crate) async fn build_store(
    config: &StoreConfig,
) -> Result<Arc<dyn JobRecordStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryJobRecordStore::new())),
        StoreBackend::Sqlite => {
            let path = match &config.path {
                Some(path) => PathBuf::from(ConfigLoader::expand_path(path)),
                None => jobhands_dir().join("jobs.db"),
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
            }
            info!(path = %path.display(), "Opening SQLite job store");
            Ok(Arc::new(SqliteJobRecordStore::open(&path).await?))
        }
    }
}

/// Run the scheduler and HTTP API until Ctrl-C.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting JobHands v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!(field = %warning.path, "{}", warning.message);
    }
    if let Some(error) = validation.into_error() {
        return Err(error.into());
    }

    let store = build_store(&config.store).await?;

    let registry = JobRegistry::new();
    register_builtin_jobs(&registry)?;
    info!(registered = registry.len(), "Job registry initialized");

    let engine = Arc::new(SchedulerEngine::new(engine_config(&config.scheduler)));
    let service = Arc::new(JobControlService::new(
        store,
        Arc::new(registry),
        Arc::clone(&engine),
    ));

    if config.scheduler.sync_registered_jobs {
        service.sync_registered_jobs().await?;
    }
    if config.scheduler.schedule_on_startup {
        service.schedule_all().await?;
    }

    engine.start()?;
    service.run_lifecycle_jobs(TriggerType::OnStartup).await?;

    let api = ApiServer::new(
        ApiServerConfig::new(config.server.host.clone(), config.server.port),
        Arc::new(ApiState::new(Arc::clone(&service))),
    );
    let served = api.run(shutdown_signal()).await;

    info!("Shutting down scheduler");
    if let Err(e) = service.run_lifecycle_jobs(TriggerType::OnShutdown).await {
        warn!(error = %e, "Shutdown jobs not submitted");
    }
    engine.shutdown(true).await;
    info!("JobHands stopped");

    served
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
    }
}
