use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::{
    jobs::JobManager,
    tts::{GenerationMode, Language, ModelSize, SPEAKERS},
};
use crate::infrastructure::backends::LoadPhase;

#[derive(Debug, Serialize)]
pub struct ModeInfo {
    pub mode: GenerationMode,
    pub model_sizes: Vec<ModelSize>,
    pub default_language: Language,
}

/// Response for GET /models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub model_sizes: Vec<ModelSize>,
    pub speakers: Vec<&'static str>,
    pub languages: Vec<Language>,
    pub modes: Vec<ModeInfo>,
    pub phase: LoadPhase,
    pub loaded_backends: Vec<String>,
}

/// GET /models - Supported options and the checkpoints currently loaded
pub async fn list_models(State(job_service): State<Arc<JobManager>>) -> Json<ModelsResponse> {
    let snapshot = job_service.registry_snapshot();

    Json(ModelsResponse {
        model_sizes: ModelSize::ALL.to_vec(),
        speakers: SPEAKERS.to_vec(),
        languages: Language::ALL.to_vec(),
        modes: GenerationMode::ALL
            .iter()
            .map(|mode| ModeInfo {
                mode: *mode,
                model_sizes: mode.supported_sizes().to_vec(),
                default_language: mode.default_language(),
            })
            .collect(),
        phase: snapshot.phase,
        loaded_backends: snapshot.loaded,
    })
}
