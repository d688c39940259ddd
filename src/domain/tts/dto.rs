use super::error::ValidationError;
use super::language::{canonical_speaker, GenerationMode, Language, ModelSize, SPEAKERS};
use crate::infrastructure::audio::decode_wav;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Request for POST /tts/jobs
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TtsJobRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    /// Voice design: natural-language description of the voice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_description: Option<String>,
    /// Custom voice: one of the predefined speakers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Custom voice: optional style instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruct: Option<String>,
    /// Voice clone: WAV file, base64 encoded (a `data:` URL prefix is accepted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_audio_base64: Option<String>,
    /// Voice clone: transcript of the reference audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_text: Option<String>,
    #[serde(default)]
    pub x_vector_only: bool,
}

/// Request for POST /tts/estimate
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub text: String,
}

/// Reference recording for voice cloning, mono and normalized to [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// How the voice of the generated speech is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceSelector {
    Design {
        description: String,
    },
    Clone {
        reference: ReferenceAudio,
        reference_text: Option<String>,
        x_vector_only: bool,
    },
    Custom {
        speaker: &'static str,
        instruct: Option<String>,
    },
}

/// A validated synthesis request. Immutable once a job captures it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    pub language: Language,
    pub model_size: ModelSize,
    pub voice: VoiceSelector,
}

impl GenerationRequest {
    pub fn mode(&self) -> GenerationMode {
        match self.voice {
            VoiceSelector::Design { .. } => GenerationMode::VoiceDesign,
            VoiceSelector::Clone { .. } => GenerationMode::VoiceClone,
            VoiceSelector::Custom { .. } => GenerationMode::CustomVoice,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl TtsJobRequest {
    /// Validate the raw request into a [`GenerationRequest`].
    ///
    /// Unknown modes, languages, sizes and speakers are rejected rather than
    /// replaced with defaults.
    pub fn validate(self, max_text_chars: usize) -> Result<GenerationRequest, ValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let char_count = text.chars().count();
        if char_count > max_text_chars {
            return Err(ValidationError::TextTooLong {
                max: max_text_chars,
                actual: char_count,
            });
        }

        let mode = match non_empty(self.mode.as_deref()) {
            Some(raw) => raw.parse::<GenerationMode>().map_err(|_| {
                ValidationError::unsupported(
                    "mode",
                    raw,
                    GenerationMode::ALL.iter().map(|m| m.as_str()),
                )
            })?,
            None => GenerationMode::VoiceDesign,
        };

        let language = match non_empty(self.language.as_deref()) {
            Some(raw) => raw.parse::<Language>().map_err(|_| {
                ValidationError::unsupported(
                    "language",
                    raw,
                    Language::ALL.iter().map(|l| l.as_str()),
                )
            })?,
            None => mode.default_language(),
        };

        let model_size = match non_empty(self.model_size.as_deref()) {
            Some(raw) => {
                let supported = mode.supported_sizes();
                raw.parse::<ModelSize>()
                    .ok()
                    .filter(|size| supported.contains(size))
                    .ok_or_else(|| {
                        ValidationError::unsupported(
                            "model_size",
                            raw,
                            supported.iter().map(|s| s.as_str()),
                        )
                    })?
            }
            None => ModelSize::Large,
        };

        let voice = match mode {
            GenerationMode::VoiceDesign => {
                let description = non_empty(self.voice_description.as_deref())
                    .ok_or(ValidationError::MissingField("Voice description"))?;
                VoiceSelector::Design {
                    description: description.to_string(),
                }
            }
            GenerationMode::VoiceClone => {
                let encoded = non_empty(self.reference_audio_base64.as_deref())
                    .ok_or(ValidationError::MissingField("Reference audio"))?;
                let reference_text = non_empty(self.reference_text.as_deref()).map(String::from);
                if !self.x_vector_only && reference_text.is_none() {
                    return Err(ValidationError::MissingField(
                        "Reference text (unless x_vector_only is enabled)",
                    ));
                }
                VoiceSelector::Clone {
                    reference: decode_reference_audio(encoded)?,
                    reference_text,
                    x_vector_only: self.x_vector_only,
                }
            }
            GenerationMode::CustomVoice => {
                let raw = non_empty(self.speaker.as_deref())
                    .ok_or(ValidationError::MissingField("Speaker"))?;
                let speaker = canonical_speaker(raw)
                    .ok_or_else(|| ValidationError::unsupported("speaker", raw, SPEAKERS))?;
                VoiceSelector::Custom {
                    speaker,
                    instruct: non_empty(self.instruct.as_deref()).map(String::from),
                }
            }
        };

        Ok(GenerationRequest {
            text: text.to_string(),
            language,
            model_size,
            voice,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn decode_reference_audio(encoded: &str) -> Result<ReferenceAudio, ValidationError> {
    // Strip "data:audio/wav;base64," if present
    let payload = if encoded.starts_with("data:") {
        encoded.split_once(',').map(|(_, data)| data).unwrap_or(encoded)
    } else {
        encoded
    };

    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ValidationError::InvalidReferenceAudio(format!("bad base64: {}", e)))?;
    let (samples, sample_rate) =
        decode_wav(&bytes).map_err(|e| ValidationError::InvalidReferenceAudio(e.to_string()))?;

    Ok(ReferenceAudio {
        samples,
        sample_rate,
    })
}
