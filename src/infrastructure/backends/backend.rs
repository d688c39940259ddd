use crate::domain::tts::{GenerationMode, GenerationRequest, ModelSize};
use crate::infrastructure::audio::AudioError;
use std::fmt;
use std::str::FromStr;

/// Identifies one loaded model checkpoint: a generation mode at a given size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendKey {
    pub mode: GenerationMode,
    pub size: ModelSize,
}

impl BackendKey {
    pub fn new(mode: GenerationMode, size: ModelSize) -> Self {
        Self { mode, size }
    }

    /// Every checkpoint the service knows how to serve
    pub fn all() -> Vec<BackendKey> {
        GenerationMode::ALL
            .iter()
            .flat_map(|mode| {
                mode.supported_sizes()
                    .iter()
                    .map(move |size| BackendKey::new(*mode, *size))
            })
            .collect()
    }
}

impl fmt::Display for BackendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mode.as_str().replace('_', "-"), self.size)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid backend key '{0}', expected <mode>-<size> such as custom-voice-0.6B")]
pub struct ParseBackendKeyError(pub String);

impl FromStr for BackendKey {
    type Err = ParseBackendKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let err = || ParseBackendKeyError(value.to_string());

        let (mode, size) = value.rsplit_once('-').ok_or_else(err)?;
        let mode = mode.parse::<GenerationMode>().map_err(|_| err())?;
        let size = size.parse::<ModelSize>().map_err(|_| err())?;
        if !mode.supported_sizes().contains(&size) {
            return Err(err());
        }

        Ok(BackendKey::new(mode, size))
    }
}

/// Raw synthesis output
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend {backend} cannot serve {mode} requests")]
    UnsupportedMode {
        backend: String,
        mode: GenerationMode,
    },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned {status}: {detail}")]
    Upstream { status: u16, detail: String },
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("{0}")]
    Other(String),
}

/// A speech-synthesis model.
///
/// `synthesize` blocks the calling thread for the whole generation and
/// implementations are not required to tolerate concurrent calls; the job
/// manager only ever invokes backends from its single worker thread.
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> String;

    fn synthesize(&self, request: &GenerationRequest) -> Result<SynthesizedAudio, BackendError>;
}
