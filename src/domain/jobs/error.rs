use super::model::JobStatus;
use crate::domain::tts::ValidationError;
use crate::error::AppError;
use crate::infrastructure::executor::ExecutorError;

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("job not found")]
    NotFound,
    #[error("job is still {0}")]
    NotReady(JobStatus),
    #[error("job failed: {0}")]
    Failed(String),
    #[error("{0}")]
    Busy(String),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ExecutorError> for JobServiceError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Busy(_) => JobServiceError::Busy(err.to_string()),
            ExecutorError::Closed | ExecutorError::Panicked(_) => {
                JobServiceError::Dependency(err.to_string())
            }
        }
    }
}

impl From<JobServiceError> for AppError {
    fn from(err: JobServiceError) -> Self {
        match err {
            JobServiceError::Invalid(e) => AppError::from(e),
            JobServiceError::NotFound => AppError::NotFound("Job not found".to_string()),
            JobServiceError::NotReady(status) => {
                AppError::NotReady(format!("Job is still {}", status))
            }
            JobServiceError::Failed(msg) => AppError::JobFailed(msg),
            JobServiceError::Busy(msg) => AppError::RateLimitExceeded(msg),
            JobServiceError::Dependency(msg) => AppError::ServiceUnavailable(msg),
            JobServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
