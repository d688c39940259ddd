use super::backend::{BackendError, BackendKey, GenerationBackend};
use crate::domain::tts::{GenerationMode, ModelSize};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Startup progress of the backend registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    NotStarted,
    Loading,
    /// Every requested backend loaded
    Ready,
    /// Some backends loaded, others gave up after retries
    Degraded,
    /// Nothing could be loaded
    Failed,
}

impl LoadPhase {
    /// Whether jobs can be served at all
    pub fn is_serving(&self) -> bool {
        matches!(self, LoadPhase::Ready | LoadPhase::Degraded)
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadPhase::NotStarted => "not_started",
            LoadPhase::Loading => "loading",
            LoadPhase::Ready => "ready",
            LoadPhase::Degraded => "degraded",
            LoadPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Produces a ready-to-use backend for a checkpoint. Called from a blocking
/// context during startup.
pub trait BackendLoader: Send + Sync {
    fn load(&self, key: BackendKey) -> Result<Arc<dyn GenerationBackend>, BackendError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// No loaded backend can serve a mode
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no loaded backend can serve {mode} requests (backend loading is {phase})")]
pub struct BackendUnavailable {
    pub mode: GenerationMode,
    pub phase: LoadPhase,
}

/// Point-in-time view of the registry for health and model listings
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub phase: LoadPhase,
    pub requested: Vec<String>,
    pub loaded: Vec<String>,
    pub failed: BTreeMap<String, String>,
}

struct RegistryState {
    phase: LoadPhase,
    backends: HashMap<BackendKey, Arc<dyn GenerationBackend>>,
    failures: HashMap<BackendKey, String>,
}

/// Loaded backends by checkpoint, plus their loading progress.
///
/// The set of requested checkpoints is fixed at construction; only the load
/// progress changes afterwards, always under the registry lock.
pub struct BackendRegistry {
    requested: Vec<BackendKey>,
    state: Mutex<RegistryState>,
}

impl BackendRegistry {
    pub fn new(requested: Vec<BackendKey>) -> Self {
        Self {
            requested,
            state: Mutex::new(RegistryState {
                phase: LoadPhase::NotStarted,
                backends: HashMap::new(),
                failures: HashMap::new(),
            }),
        }
    }

    /// Registry whose backends are already available
    pub fn preloaded(backends: Vec<(BackendKey, Arc<dyn GenerationBackend>)>) -> Self {
        let requested = backends.iter().map(|(key, _)| *key).collect();
        let registry = Self::new(requested);
        {
            let mut state = registry.state.lock();
            state.backends = backends.into_iter().collect();
            state.phase = if state.backends.is_empty() {
                LoadPhase::Failed
            } else {
                LoadPhase::Ready
            };
        }
        registry
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.lock().phase
    }

    pub fn requested(&self) -> &[BackendKey] {
        &self.requested
    }

    /// Load every requested backend, retrying each one per `policy`.
    ///
    /// Blocks the calling thread; run it on a blocking pool.
    pub fn load_all(&self, loader: &dyn BackendLoader, policy: &RetryPolicy) -> LoadPhase {
        self.state.lock().phase = LoadPhase::Loading;
        tracing::info!(backends = self.requested.len(), "Loading generation backends");

        for key in &self.requested {
            match load_with_retry(loader, *key, policy) {
                Ok(backend) => {
                    let mut state = self.state.lock();
                    state.failures.remove(key);
                    state.backends.insert(*key, backend);
                }
                Err(err) => {
                    self.state.lock().failures.insert(*key, err.to_string());
                }
            }
        }

        let mut state = self.state.lock();
        state.phase = if !self.requested.is_empty() && state.backends.len() == self.requested.len()
        {
            LoadPhase::Ready
        } else if !state.backends.is_empty() {
            LoadPhase::Degraded
        } else {
            LoadPhase::Failed
        };

        match state.phase {
            LoadPhase::Ready => tracing::info!("All generation backends loaded"),
            phase => tracing::warn!(
                phase = %phase,
                loaded = state.backends.len(),
                failed = state.failures.len(),
                "Generation backends only partially available"
            ),
        }

        state.phase
    }

    /// Pick the backend for a mode, preferring the requested size and falling
    /// back to the other published size of the same mode.
    pub fn resolve(
        &self,
        mode: GenerationMode,
        size: ModelSize,
    ) -> Result<(BackendKey, Arc<dyn GenerationBackend>), BackendUnavailable> {
        let state = self.state.lock();

        let candidates = [size, size.other()];
        for candidate in candidates {
            if !mode.supported_sizes().contains(&candidate) {
                continue;
            }
            let key = BackendKey::new(mode, candidate);
            if let Some(backend) = state.backends.get(&key) {
                if candidate != size {
                    tracing::warn!(
                        mode = %mode,
                        requested_size = %size,
                        fallback_size = %candidate,
                        "Requested backend not loaded, falling back"
                    );
                }
                return Ok((key, Arc::clone(backend)));
            }
        }

        Err(BackendUnavailable {
            mode,
            phase: state.phase,
        })
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock();
        let mut loaded: Vec<String> = state.backends.keys().map(|k| k.to_string()).collect();
        loaded.sort();

        RegistrySnapshot {
            phase: state.phase,
            requested: self.requested.iter().map(|k| k.to_string()).collect(),
            loaded,
            failed: state
                .failures
                .iter()
                .map(|(key, err)| (key.to_string(), err.clone()))
                .collect(),
        }
    }
}

fn load_with_retry(
    loader: &dyn BackendLoader,
    key: BackendKey,
    policy: &RetryPolicy,
) -> Result<Arc<dyn GenerationBackend>, BackendError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match loader.load(key) {
            Ok(backend) => {
                tracing::info!(backend = %key, attempt, "Backend loaded");
                return Ok(backend);
            }
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    backend = %key,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "Backend load failed, retrying"
                );
                thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    backend = %key,
                    attempts,
                    error = %err,
                    "Backend load failed, giving up"
                );
                return Err(err);
            }
        }
    }
}
