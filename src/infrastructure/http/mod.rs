pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{health, jobs::JobsController, models};
use crate::domain::jobs::JobManager;
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router with all routes and layers
pub fn build_router(job_service: Arc<JobManager>, jobs_controller: Arc<JobsController>) -> Router {
    // Health and catalogue routes read the job manager directly
    let status_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .route("/models", get(models::list_models))
        .with_state(job_service);

    let job_routes = Router::new()
        .route("/tts/jobs", post(JobsController::create_job))
        .route("/tts/jobs/:job_id", get(JobsController::get_job))
        .route("/tts/jobs/:job_id/result", get(JobsController::get_job_result))
        .route(
            "/tts/jobs/:job_id/result/base64",
            get(JobsController::get_job_result_base64),
        )
        .route("/tts/estimate", post(JobsController::estimate))
        .with_state(jobs_controller);

    Router::new()
        .merge(status_routes)
        .merge(job_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server and serve until ctrl-c
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
