pub mod backend;
pub mod registry;
pub mod remote_qwen;

pub use backend::{
    BackendError, BackendKey, GenerationBackend, ParseBackendKeyError, SynthesizedAudio,
};
pub use registry::{
    BackendLoader, BackendRegistry, BackendUnavailable, LoadPhase, RegistrySnapshot, RetryPolicy,
};
pub use remote_qwen::{RemoteQwenBackend, RemoteQwenLoader};
