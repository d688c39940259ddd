use crate::error::AppError;

/// Request problems detected before a job is created
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Text is required")]
    EmptyText,
    #[error("Text must be {max} characters or less (got {actual})")]
    TextTooLong { max: usize, actual: usize },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Unsupported {field} '{value}'. Supported: {supported}")]
    Unsupported {
        field: &'static str,
        value: String,
        supported: String,
    },
    #[error("Reference audio is invalid: {0}")]
    InvalidReferenceAudio(String),
}

impl ValidationError {
    pub(crate) fn unsupported<S: AsRef<str>>(
        field: &'static str,
        value: &str,
        supported: impl IntoIterator<Item = S>,
    ) -> Self {
        let supported = supported
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ValidationError::Unsupported {
            field,
            value: value.to_string(),
            supported,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::TextTooLong { .. } => AppError::PayloadTooLarge(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
