use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::jobs::JobManager;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready once at least one backend is loaded
pub async fn health_ready(State(job_service): State<Arc<JobManager>>) -> impl IntoResponse {
    let snapshot = job_service.registry_snapshot();
    let queue = job_service.queue_stats();

    let (status_code, status) = if snapshot.phase.is_serving() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "phase": snapshot.phase,
            "backends": {
                "requested": snapshot.requested,
                "loaded": snapshot.loaded,
                "failed": snapshot.failed,
            },
            "queue": queue,
        })),
    )
}
