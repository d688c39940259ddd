pub mod error;
pub mod estimation;
pub mod model;
pub mod service;

pub use error::JobServiceError;
pub use estimation::{Estimate, EstimationModel, EstimationSample};
pub use model::{AudioArtifact, FailureKind, Job, JobFailure, JobReceipt, JobStatus, JobStatusView};
pub use service::{JobManager, JobServiceApi, QueueStats};
