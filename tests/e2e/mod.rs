// End-to-end tests for the Qwen TTS gateway HTTP API
//
// Each test starts the real router on an ephemeral port. Backends are
// in-process stubs that synthesize a short sine tone, so jobs go through
// the real store, executor and registry without an inference server.

mod helpers;
mod test_estimate;
mod test_health;
