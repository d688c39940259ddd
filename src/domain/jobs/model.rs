use crate::domain::tts::{GenerationMode, GenerationRequest};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No loaded backend could serve the request
    BackendUnavailable,
    /// The backend call itself failed
    BackendFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::BackendUnavailable,
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::BackendFailure,
            message: message.into(),
        }
    }
}

/// Encoded audio produced by a finished job
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub audio: Bytes,
    pub content_type: &'static str,
    pub filename: String,
    pub sample_rate: u32,
    pub num_samples: usize,
    /// Checkpoint that produced the audio, e.g. `custom-voice-1.7B`
    pub backend: String,
    /// Wall time of the backend call alone
    pub generation_time_ms: u64,
}

impl AudioArtifact {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 / self.sample_rate as f64
    }
}

/// One generation request and its lifecycle.
///
/// Status only moves forward: `queued -> running -> done | failed`. The
/// transition methods refuse anything else and report whether they applied.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub created_at: Instant,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub request: Arc<GenerationRequest>,
    pub result: Option<AudioArtifact>,
    pub error: Option<JobFailure>,
    pub generation_time_ms: Option<u64>,
}

impl Job {
    pub fn new(request: Arc<GenerationRequest>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            created_at: Instant::now(),
            started_at: None,
            finished_at: None,
            request,
            result: None,
            error: None,
            generation_time_ms: None,
        }
    }

    pub fn mark_running(&mut self) -> bool {
        if self.status != JobStatus::Queued {
            return false;
        }
        self.status = JobStatus::Running;
        self.started_at = Some(Instant::now());
        true
    }

    /// Takes `generation_time_ms` from the artifact, so it excludes backend
    /// resolution and encoding
    pub fn complete(&mut self, artifact: AudioArtifact) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Done;
        self.finished_at = Some(Instant::now());
        self.generation_time_ms = Some(artifact.generation_time_ms);
        self.result = Some(artifact);
        true
    }

    pub fn fail(&mut self, failure: JobFailure) -> bool {
        if self.status != JobStatus::Running {
            return false;
        }
        self.status = JobStatus::Failed;
        self.finished_at = Some(Instant::now());
        self.error = Some(failure);
        true
    }

    /// Time since creation, frozen once the job finishes
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.created_at)
    }

    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id,
            status: self.status,
            mode: self.request.mode(),
            submitted_at: self.submitted_at,
            elapsed_seconds: self.elapsed().as_secs_f64(),
            generation_time_ms: self.generation_time_ms,
            error: self.error.as_ref().map(|e| e.message.clone()),
            error_kind: self.error.as_ref().map(|e| e.kind),
        }
    }
}

/// Response for GET /tts/jobs/:job_id
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub mode: GenerationMode,
    pub submitted_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

/// Response for POST /tts/jobs
#[derive(Debug, Clone, Serialize)]
pub struct JobReceipt {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub estimated_seconds: f64,
}
