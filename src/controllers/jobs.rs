use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        jobs::{Estimate, JobManager, JobReceipt, JobServiceApi, JobStatusView},
        tts::{EstimateRequest, TtsJobRequest},
    },
    error::{AppError, AppResult},
    infrastructure::http::RequestId,
};

/// Response for GET /tts/jobs/:job_id/result/base64
#[derive(Debug, Serialize)]
pub struct Base64AudioResponse {
    pub job_id: Uuid,
    pub audio: String,
    pub format: &'static str,
    pub sample_rate: u32,
    pub filename: String,
    pub backend: String,
    pub generation_time_ms: u64,
}

pub struct JobsController {
    job_service: Arc<JobManager>,
    max_text_chars: usize,
}

impl JobsController {
    pub fn new(job_service: Arc<JobManager>, max_text_chars: usize) -> Self {
        Self {
            job_service,
            max_text_chars,
        }
    }

    /// POST /tts/jobs - Queue a generation job
    pub async fn create_job(
        State(controller): State<Arc<JobsController>>,
        Extension(request_id): Extension<RequestId>,
        Json(request): Json<TtsJobRequest>,
    ) -> AppResult<(StatusCode, Json<JobReceipt>)> {
        let request = request.validate(controller.max_text_chars)?;
        let receipt = controller.job_service.create_job(request).await?;

        tracing::debug!(
            request_id = %request_id.0,
            job_id = %receipt.job_id,
            "Job accepted"
        );

        Ok((StatusCode::ACCEPTED, Json(receipt)))
    }

    /// GET /tts/jobs/:job_id - Poll job status
    pub async fn get_job(
        State(controller): State<Arc<JobsController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<JobStatusView>> {
        let view = controller.job_service.get_status(job_id).await?;
        Ok(Json(view))
    }

    /// GET /tts/jobs/:job_id/result - Download the generated WAV
    pub async fn get_job_result(
        State(controller): State<Arc<JobsController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let artifact = controller.job_service.get_result(job_id).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(artifact.content_type),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            header_value(&format!("attachment; filename=\"{}\"", artifact.filename))?,
        );
        headers.insert("X-TTS-Model", header_value(&artifact.backend)?);
        headers.insert(
            "X-Generation-Time-Ms",
            HeaderValue::from(artifact.generation_time_ms),
        );

        Ok((StatusCode::OK, headers, Body::from(artifact.audio)))
    }

    /// GET /tts/jobs/:job_id/result/base64 - Generated WAV wrapped in JSON
    pub async fn get_job_result_base64(
        State(controller): State<Arc<JobsController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<Base64AudioResponse>> {
        let artifact = controller.job_service.get_result(job_id).await?;

        Ok(Json(Base64AudioResponse {
            job_id,
            audio: general_purpose::STANDARD.encode(&artifact.audio),
            format: "wav",
            sample_rate: artifact.sample_rate,
            filename: artifact.filename,
            backend: artifact.backend,
            generation_time_ms: artifact.generation_time_ms,
        }))
    }

    /// POST /tts/estimate - Predict generation time without queueing
    pub async fn estimate(
        State(controller): State<Arc<JobsController>>,
        Json(request): Json<EstimateRequest>,
    ) -> AppResult<Json<Estimate>> {
        let estimate = controller.job_service.estimate(&request.text).await?;
        Ok(Json(estimate))
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("invalid header value '{}': {}", value, e)))
}
