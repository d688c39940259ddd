use super::backend::{BackendError, BackendKey, GenerationBackend, SynthesizedAudio};
use super::registry::BackendLoader;
use crate::domain::tts::{GenerationRequest, VoiceSelector};
use crate::infrastructure::audio::{decode_wav, encode_wav, WAV_CONTENT_TYPE};
use reqwest::blocking::{multipart, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest error body echoed back from the upstream server
const MAX_ERROR_DETAIL: usize = 500;

/// Qwen3-TTS checkpoint served by an upstream inference server.
///
/// Each instance is bound to one checkpoint and talks to the upstream's
/// form-based endpoints (`/voice-design`, `/voice-clone`, `/custom-voice`),
/// which reply with a WAV file.
pub struct RemoteQwenBackend {
    client: Client,
    base_url: String,
    key: BackendKey,
}

impl RemoteQwenBackend {
    pub fn new(client: Client, base_url: impl Into<String>, key: BackendKey) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key,
        }
    }

    fn build_form(
        &self,
        request: &GenerationRequest,
    ) -> Result<(&'static str, multipart::Form), BackendError> {
        let language = request.language.as_str();
        let model_size = self.key.size.as_str();

        let form = match &request.voice {
            VoiceSelector::Design { description } => (
                "/voice-design",
                multipart::Form::new()
                    .text("text", request.text.clone())
                    .text("language", language)
                    .text("voice_description", description.clone()),
            ),
            VoiceSelector::Clone {
                reference,
                reference_text,
                x_vector_only,
            } => {
                let wav = encode_wav(&reference.samples, reference.sample_rate)?;
                let part = multipart::Part::bytes(wav)
                    .file_name("reference.wav")
                    .mime_str(WAV_CONTENT_TYPE)?;
                (
                    "/voice-clone",
                    multipart::Form::new()
                        .part("ref_audio", part)
                        .text("ref_text", reference_text.clone().unwrap_or_default())
                        .text("target_text", request.text.clone())
                        .text("language", language)
                        .text("use_xvector_only", x_vector_only.to_string())
                        .text("model_size", model_size),
                )
            }
            VoiceSelector::Custom { speaker, instruct } => (
                "/custom-voice",
                multipart::Form::new()
                    .text("text", request.text.clone())
                    .text("language", language)
                    .text("speaker", *speaker)
                    .text("instruct", instruct.clone().unwrap_or_default())
                    .text("model_size", model_size),
            ),
        };

        Ok(form)
    }
}

impl GenerationBackend for RemoteQwenBackend {
    fn name(&self) -> String {
        format!("qwen3-tts-{}", self.key)
    }

    fn synthesize(&self, request: &GenerationRequest) -> Result<SynthesizedAudio, BackendError> {
        if request.mode() != self.key.mode {
            return Err(BackendError::UnsupportedMode {
                backend: self.name(),
                mode: request.mode(),
            });
        }

        let (path, form) = self.build_form(request)?;
        let url = format!("{}{}", self.base_url, path);
        let start_time = Instant::now();

        tracing::info!(
            backend = %self.key,
            url = %url,
            text_length = request.text.len(),
            "Calling upstream TTS server"
        );

        let response = self.client.post(&url).multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail: String = body.chars().take(MAX_ERROR_DETAIL).collect();
            tracing::error!(
                backend = %self.key,
                status = status.as_u16(),
                detail = %detail,
                "Upstream TTS call failed"
            );
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes()?;
        let (samples, sample_rate) = decode_wav(&bytes)?;

        tracing::debug!(
            backend = %self.key,
            latency_ms = start_time.elapsed().as_millis() as u64,
            audio_size_bytes = bytes.len(),
            "Upstream audio received"
        );

        Ok(SynthesizedAudio {
            samples,
            sample_rate,
        })
    }
}

/// Loads [`RemoteQwenBackend`]s once the upstream answers its health check
pub struct RemoteQwenLoader {
    client: Client,
    base_url: String,
}

impl RemoteQwenLoader {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl BackendLoader for RemoteQwenLoader {
    fn load(&self, key: BackendKey) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                detail: format!("health check failed for {}", key),
            });
        }

        Ok(Arc::new(RemoteQwenBackend::new(
            self.client.clone(),
            self.base_url.clone(),
            key,
        )))
    }
}
