//! Common test utilities.
//!
//! Builds the real router in-process with the DICOM builder and PACS client
//! replaced by mocks, so API behavior can be tested end to end without DCMTK
//! or a PACS.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fhirbridge_core::testing::{MockDicomBuilder, MockPacsClient};
use fhirbridge_core::{
    dispatcher, load_config_from_str, DicomBuilder, PacsClient, SqliteTaskStore, TaskStore,
};
use fhirbridge_server::api::create_router;
use fhirbridge_server::state::AppState;

/// Re-export fixtures for test convenience
pub use fhirbridge_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[pacs]
send_method = "dimse"

[pacs.dimse]
aet = "TESTPACS"
host = "127.0.0.1"
port = 11112
"#;

pub struct TestFixture {
    pub router: Router,
    pub builder: Arc<MockDicomBuilder>,
    pub pacs: Arc<MockPacsClient>,
    // Kept alive in stalled fixtures so submits see a full queue instead of
    // a closed channel.
    _idle_worker: Option<fhirbridge_core::DispatchWorker>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// A fixture whose dispatch worker is running.
    pub fn new() -> Self {
        Self::build(16, true)
    }

    /// A fixture whose dispatch queue is never drained, for backpressure
    /// tests.
    pub fn stalled(queue_size: usize) -> Self {
        Self::build(queue_size, false)
    }

    fn build(queue_size: usize, spawn_worker: bool) -> Self {
        let config = load_config_from_str(TEST_CONFIG).expect("test config must parse");

        let task_store: Arc<dyn TaskStore> =
            Arc::new(SqliteTaskStore::in_memory().expect("in-memory store"));
        let builder = Arc::new(MockDicomBuilder::new());
        let pacs = Arc::new(MockPacsClient::new());

        let (dispatcher, worker) = dispatcher::channel(queue_size);
        let idle_worker = if spawn_worker {
            tokio::spawn(worker.run());
            None
        } else {
            Some(worker)
        };

        let state = Arc::new(AppState::new(
            config,
            task_store,
            Arc::clone(&builder) as Arc<dyn DicomBuilder>,
            Arc::clone(&pacs) as Arc<dyn PacsClient>,
            dispatcher,
        ));

        Self {
            router: create_router(state),
            builder,
            pacs,
            _idle_worker: idle_worker,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Poll a task until it reaches a terminal status.
    pub async fn wait_for_terminal(&self, id: &str) -> String {
        for _ in 0..200 {
            let response = self.get(&format!("/fhir/Task/{id}")).await;
            assert_eq!(response.status, StatusCode::OK);
            let status = response.body["status"]
                .as_str()
                .expect("task has a status")
                .to_string();
            if matches!(status.as_str(), "completed" | "failed" | "rejected") {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Task {id} never reached a terminal status");
    }
}
