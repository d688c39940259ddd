use super::error::JobServiceError;
use super::estimation::{Estimate, EstimationModel, EstimationSample};
use super::model::{AudioArtifact, Job, JobFailure, JobReceipt, JobStatus, JobStatusView};
use crate::domain::tts::GenerationRequest;
use crate::infrastructure::audio::{encode_wav, WAV_CONTENT_TYPE};
use crate::infrastructure::backends::{BackendError, BackendRegistry, RegistrySnapshot};
use crate::infrastructure::executor::SingleWorkerExecutor;
use crate::infrastructure::repositories::{JobCounts, JobStore};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Queue and store occupancy, reported by `/health/ready`
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub max_pending: usize,
    pub stored_jobs: usize,
    pub store_capacity: usize,
    pub jobs: JobCounts,
    pub estimation_samples: u64,
}

/// Owns the generation job lifecycle.
///
/// Jobs are recorded in the [`JobStore`] and their backend calls run on the
/// [`SingleWorkerExecutor`], so at most one synthesis is in flight while
/// status polls and estimates are answered immediately.
pub struct JobManager {
    store: Arc<JobStore>,
    executor: Arc<SingleWorkerExecutor>,
    registry: Arc<BackendRegistry>,
    estimator: Arc<EstimationModel>,
}

impl JobManager {
    pub fn new(
        store: Arc<JobStore>,
        executor: Arc<SingleWorkerExecutor>,
        registry: Arc<BackendRegistry>,
        estimator: Arc<EstimationModel>,
    ) -> Self {
        Self {
            store,
            executor,
            registry,
            estimator,
        }
    }

    pub fn registry_snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    pub fn queue_stats(&self) -> QueueStats {
        QueueStats {
            pending: self.executor.pending(),
            max_pending: self.executor.max_pending(),
            stored_jobs: self.store.len(),
            store_capacity: self.store.capacity(),
            jobs: self.store.counts(),
            estimation_samples: self.estimator.sample_count(),
        }
    }
}

#[async_trait]
pub trait JobServiceApi: Send + Sync {
    /// Record a queued job and hand its generation to the worker.
    ///
    /// Fails only when the queue is full or the worker is gone; backend
    /// problems surface later as a failed job.
    async fn create_job(&self, request: GenerationRequest) -> Result<JobReceipt, JobServiceError>;

    async fn get_status(&self, job_id: Uuid) -> Result<JobStatusView, JobServiceError>;

    /// Audio of a finished job. Reading does not consume it.
    async fn get_result(&self, job_id: Uuid) -> Result<AudioArtifact, JobServiceError>;

    /// Approximate generation time for `text`
    async fn estimate(&self, text: &str) -> Result<Estimate, JobServiceError>;
}

#[async_trait]
impl JobServiceApi for JobManager {
    async fn create_job(&self, request: GenerationRequest) -> Result<JobReceipt, JobServiceError> {
        let request = Arc::new(request);
        let estimated_seconds = self
            .estimator
            .estimate_counts(request.char_count(), request.word_count());

        let job = Job::new(Arc::clone(&request));
        let job_id = job.id;

        // The worker skips ids it cannot find, so the job is stored before submission
        self.store.insert(job);

        let worker = GenerationWorker {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            estimator: Arc::clone(&self.estimator),
        };
        let handle = match self.executor.submit(move || worker.run(job_id, &request)) {
            Ok(handle) => handle,
            Err(err) => {
                self.store.remove(job_id);
                tracing::warn!(job_id = %job_id, error = %err, "Generation job rejected");
                return Err(err.into());
            }
        };

        // Only admitted jobs may push older ones out
        let evicted = self.store.evict_excess();
        if !evicted.is_empty() {
            tracing::debug!(
                evicted = evicted.len(),
                capacity = self.store.capacity(),
                "Evicted oldest jobs from store"
            );
        }

        // A panicking backend never reaches its own failure bookkeeping
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = handle.wait().await {
                tracing::error!(job_id = %job_id, error = %err, "Generation task aborted");
                store.update(job_id, |job| job.fail(JobFailure::backend(err.to_string())));
            }
        });

        tracing::info!(
            job_id = %job_id,
            pending = self.executor.pending(),
            estimated_seconds,
            "Generation job queued"
        );

        Ok(JobReceipt {
            job_id,
            status: JobStatus::Queued,
            estimated_seconds,
        })
    }

    async fn get_status(&self, job_id: Uuid) -> Result<JobStatusView, JobServiceError> {
        self.store
            .get(job_id)
            .map(|job| job.status_view())
            .ok_or(JobServiceError::NotFound)
    }

    async fn get_result(&self, job_id: Uuid) -> Result<AudioArtifact, JobServiceError> {
        let job = self.store.get(job_id).ok_or(JobServiceError::NotFound)?;

        match job.status {
            JobStatus::Done => job.result.ok_or_else(|| {
                JobServiceError::Other(anyhow::anyhow!("job {} is done but has no result", job_id))
            }),
            JobStatus::Failed => Err(JobServiceError::Failed(
                job.error
                    .map(|failure| failure.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            )),
            status => Err(JobServiceError::NotReady(status)),
        }
    }

    async fn estimate(&self, text: &str) -> Result<Estimate, JobServiceError> {
        Ok(self.estimator.estimate(text)?)
    }
}

/// The part of a job that runs on the executor thread
struct GenerationWorker {
    store: Arc<JobStore>,
    registry: Arc<BackendRegistry>,
    estimator: Arc<EstimationModel>,
}

impl GenerationWorker {
    fn run(&self, job_id: Uuid, request: &GenerationRequest) {
        if self.store.update(job_id, Job::mark_running) != Some(true) {
            tracing::warn!(job_id = %job_id, "Job evicted before it started, skipping generation");
            return;
        }

        let mode = request.mode();
        let (key, backend) = match self.registry.resolve(mode, request.model_size) {
            Ok(resolved) => resolved,
            Err(unavailable) => {
                tracing::warn!(job_id = %job_id, error = %unavailable, "No backend for job");
                self.store.update(job_id, |job| {
                    job.fail(JobFailure::unavailable(unavailable.to_string()))
                });
                return;
            }
        };

        tracing::info!(
            job_id = %job_id,
            backend = %key,
            provider = %backend.name(),
            mode = %mode,
            char_count = request.char_count(),
            "Generation started"
        );

        let start_time = Instant::now();
        let synthesized = backend.synthesize(request);
        let backend_time = start_time.elapsed();

        let outcome = synthesized.and_then(|audio| {
            let wav = encode_wav(&audio.samples, audio.sample_rate)?;
            Ok(AudioArtifact {
                audio: Bytes::from(wav),
                content_type: WAV_CONTENT_TYPE,
                filename: mode.filename(),
                sample_rate: audio.sample_rate,
                num_samples: audio.samples.len(),
                backend: key.to_string(),
                generation_time_ms: backend_time.as_millis() as u64,
            })
        });

        match outcome {
            Ok(artifact) => {
                let audio_secs = artifact.duration_secs();
                self.store.update(job_id, |job| job.complete(artifact));
                self.estimator.record(EstimationSample {
                    char_count: request.char_count(),
                    word_count: request.word_count(),
                    duration_secs: backend_time.as_secs_f64(),
                });
                tracing::info!(
                    job_id = %job_id,
                    backend = %key,
                    audio_secs,
                    generation_ms = backend_time.as_millis() as u64,
                    "Generation finished"
                );
            }
            Err(err) => {
                tracing::error!(job_id = %job_id, backend = %key, error = %err, "Generation failed");
                self.store.update(job_id, |job| job.fail(failure_for(&err)));
            }
        }
    }
}

fn failure_for(err: &BackendError) -> JobFailure {
    JobFailure::backend(format!("Generation failed: {}", err))
}
