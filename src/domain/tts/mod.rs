pub mod dto;
pub mod error;
pub mod language;

pub use dto::{
    EstimateRequest, GenerationRequest, ReferenceAudio, TtsJobRequest, VoiceSelector,
};
pub use error::ValidationError;
pub use language::{canonical_speaker, GenerationMode, Language, ModelSize, SPEAKERS};
