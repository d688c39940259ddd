use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use qwen_tts_gateway::controllers::jobs::JobsController;
use qwen_tts_gateway::domain::jobs::{EstimationModel, JobManager};
use qwen_tts_gateway::infrastructure::backends::{BackendRegistry, RemoteQwenLoader};
use qwen_tts_gateway::infrastructure::config::{Config, LogFormat};
use qwen_tts_gateway::infrastructure::executor::SingleWorkerExecutor;
use qwen_tts_gateway::infrastructure::http::{build_router, start_http_server};
use qwen_tts_gateway::infrastructure::repositories::JobStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Qwen TTS gateway on {}:{}",
        config.host,
        config.port
    );
    tracing::info!(
        upstream = %config.upstream_url,
        backends = ?config.backends.iter().map(ToString::to_string).collect::<Vec<_>>(),
        development = config.is_development(),
        "Configuration loaded"
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Job infrastructure
    let store = Arc::new(JobStore::new(config.job_store_capacity));
    let executor = Arc::new(SingleWorkerExecutor::new(
        "tts-generation",
        config.job_queue_max_pending,
    )?);
    let registry = Arc::new(BackendRegistry::new(config.backends.clone()));
    let estimator = Arc::new(EstimationModel::new());

    // 2. Load backends in the background; jobs fail as unavailable until then
    {
        let registry = registry.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let loader = match RemoteQwenLoader::new(&config.upstream_url, config.upstream_timeout()) {
                Ok(loader) => loader,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build upstream client");
                    return;
                }
            };
            let phase = registry.load_all(&loader, &config.retry_policy());
            tracing::info!(phase = %phase, "Backend loading finished");
        });
    }

    // 3. Services
    let job_service = Arc::new(JobManager::new(
        store,
        executor.clone(),
        registry,
        estimator,
    ));

    // 4. Controllers
    let jobs_controller = Arc::new(JobsController::new(
        job_service.clone(),
        config.max_text_chars,
    ));

    let app = build_router(job_service.clone(), jobs_controller);
    start_http_server(config, app).await?;

    // Let queued generations finish, then release the blocking upstream clients off the runtime
    tracing::info!(pending = executor.pending(), "Draining generation queue");
    tokio::task::spawn_blocking(move || {
        executor.shutdown();
        drop(job_service);
    })
    .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "qwen_tts_gateway=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "qwen_tts_gateway=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
