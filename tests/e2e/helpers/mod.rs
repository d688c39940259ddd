use anyhow::Result;
use axum::Router;
use qwen_tts_gateway::{
    controllers::jobs::JobsController,
    domain::{jobs::{EstimationModel, JobManager}, tts::GenerationRequest},
    infrastructure::{
        backends::{BackendError, BackendKey, BackendRegistry, GenerationBackend, SynthesizedAudio},
        executor::SingleWorkerExecutor,
        http::build_router,
        repositories::JobStore,
    },
};
use serde_json::Value;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;

use api_client::TestClient;

pub const SAMPLE_RATE: u32 = 24000;
pub const MAX_TEXT_CHARS: usize = 200;
pub const STORE_CAPACITY: usize = 5;
pub const MAX_PENDING: usize = 8;

/// Backend stand-in: a 440Hz tone, ten samples per character.
///
/// Text containing `fail` makes the call error out. Overlapping calls are
/// counted so tests can check that generation is serialized. Calls hold
/// until `released` is set.
pub struct StubBackend {
    key: BackendKey,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl GenerationBackend for StubBackend {
    fn name(&self) -> String {
        format!("stub-{}", self.key)
    }

    fn synthesize(&self, request: &GenerationRequest) -> Result<SynthesizedAudio, BackendError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        while !self.released.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }
        std::thread::sleep(self.delay);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.text.contains("fail") {
            return Err(BackendError::Upstream {
                status: 500,
                detail: "CUDA out of memory".to_string(),
            });
        }

        let samples = (0..request.text.chars().count() * 10)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        Ok(SynthesizedAudio {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let max_in_flight = Arc::new(AtomicUsize::new(0));
            let backends = stub_backends(max_in_flight.clone(), Arc::new(AtomicBool::new(true)));

            let app = create_app(BackendRegistry::preloaded(backends))
                .expect("Failed to create app");
            let client = serve(app).await;

            Self {
                client,
                max_in_flight,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Server task ends with the test runtime
        }
    }
}

/// Server whose backends block until the test opens the gate, so the
/// generation queue can be filled without racing the worker
pub struct GatedContext {
    pub client: TestClient,
    released: Arc<AtomicBool>,
}

impl GatedContext {
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl AsyncTestContext for GatedContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let released = Arc::new(AtomicBool::new(false));
            let backends = stub_backends(Arc::new(AtomicUsize::new(0)), released.clone());
            let app = create_app(BackendRegistry::preloaded(backends))
                .expect("Failed to create app");

            Self {
                client: serve(app).await,
                released,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            // Unblock the worker thread if the test bailed out early
            self.release();
        }
    }
}

/// Server whose backends never loaded, as during a cold start
pub struct ColdStartContext {
    pub client: TestClient,
}

impl AsyncTestContext for ColdStartContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let app = create_app(BackendRegistry::new(BackendKey::all()))
                .expect("Failed to create app");
            Self {
                client: serve(app).await,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}

fn stub_backends(
    max_in_flight: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
) -> Vec<(BackendKey, Arc<dyn GenerationBackend>)> {
    let in_flight = Arc::new(AtomicUsize::new(0));
    BackendKey::all()
        .into_iter()
        .map(|key| {
            let backend: Arc<dyn GenerationBackend> = Arc::new(StubBackend {
                key,
                delay: Duration::from_millis(50),
                in_flight: in_flight.clone(),
                max_in_flight: max_in_flight.clone(),
                released: released.clone(),
            });
            (key, backend)
        })
        .collect()
}

fn create_app(registry: BackendRegistry) -> Result<Router> {
    let job_service = Arc::new(JobManager::new(
        Arc::new(JobStore::new(STORE_CAPACITY)),
        Arc::new(SingleWorkerExecutor::new("e2e-tts-worker", MAX_PENDING)?),
        Arc::new(registry),
        Arc::new(EstimationModel::new()),
    ));
    let jobs_controller = Arc::new(JobsController::new(job_service.clone(), MAX_TEXT_CHARS));

    Ok(build_router(job_service, jobs_controller))
}

async fn serve(app: Router) -> TestClient {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestClient::new(&format!("http://{}", addr))
}

/// Poll a job until it is done or failed and return its last status body
pub async fn wait_for_terminal(client: &TestClient, job_id: &str) -> Value {
    for _ in 0..200 {
        let response = client.get(&format!("/tts/jobs/{}", job_id)).await.unwrap();
        let body = response.body.clone().expect("status body");
        match body["status"].as_str() {
            Some("done") | Some("failed") => return body,
            _ => tokio::time::sleep(Duration::from_millis(25)).await,
        }
    }
    panic!("job {} did not reach a terminal state", job_id);
}

/// Submit a job and return its id
pub async fn submit(client: &TestClient, body: &Value) -> String {
    let response = client.post("/tts/jobs", body).await.unwrap();
    response.assert_status(hyper::StatusCode::ACCEPTED);
    response.body.as_ref().unwrap()["job_id"]
        .as_str()
        .expect("job_id")
        .to_string()
}

pub fn custom_voice(text: &str) -> Value {
    serde_json::json!({
        "mode": "custom_voice",
        "text": text,
        "speaker": "Ryan",
        "model_size": "0.6B",
    })
}

pub fn voice_design(text: &str) -> Value {
    serde_json::json!({
        "mode": "voice_design",
        "text": text,
        "voice_description": "A calm, low-pitched narrator",
    })
}
