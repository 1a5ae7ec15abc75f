//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock collaborators injected, so event handling can be exercised
//! without cloud services or Ghostscript.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pngflow_core::{
    config::{NotifierConfig, PipelineConfig},
    testing::{MockItemStore, MockNotifier, MockRasterizer, MockStorage},
    CompletionAggregator, EventPipeline, RenderOptions, UntrackedFilePolicy,
};

/// Re-export fixtures for test convenience
pub use pngflow_core::testing::fixtures;

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - Object storage (MockStorage)
/// - Rasterizer (MockRasterizer)
/// - Item store (MockItemStore)
/// - Completion webhook (MockNotifier)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_push() {
///     let fixture = TestFixture::new().await;
///     fixture.storage.put_object("pdf-to-png", "a(O1)(I1).pdf", b"%PDF").await;
///
///     let response = fixture.post("/pubsub/push", envelope).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub storage: Arc<MockStorage>,
    pub rasterizer: Arc<MockRasterizer>,
    pub items: Arc<MockItemStore>,
    pub notifier: Arc<MockNotifier>,
    /// Workspace root for the pipeline
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with the default (reject) untracked-file policy.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let storage = Arc::new(MockStorage::new());
        let rasterizer = Arc::new(MockRasterizer::new());
        let items = Arc::new(MockItemStore::new());
        let notifier = Arc::new(MockNotifier::new());

        let pipeline_config = PipelineConfig {
            workspace_root: temp_dir.path().join("workspaces"),
            output_bucket: test_config.output_bucket.clone(),
            untracked_files: test_config.untracked_files,
        };
        let mut config = fixtures::local_config(pipeline_config.clone());
        config.notifier = test_config.notifier.clone();

        let pipeline = EventPipeline::new(
            pipeline_config,
            Arc::clone(&storage) as Arc<dyn pngflow_core::ObjectStorage>,
            Arc::clone(&rasterizer) as Arc<dyn pngflow_core::Rasterizer>,
            RenderOptions::default(),
            CompletionAggregator::new(
                Arc::clone(&items) as Arc<dyn pngflow_core::ItemStore>,
                "approved",
            ),
        )
        .with_notifier(Arc::clone(&notifier) as Arc<dyn pngflow_core::Notifier>);

        let state = Arc::new(pngflow_server::state::AppState::new(
            config,
            Arc::new(pipeline),
        ));
        let router = pngflow_server::api::create_router(state);

        Self {
            router,
            storage,
            rasterizer,
            items,
            notifier,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_raw(path, &body.to_string()).await
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

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }

    /// Number of workspaces left on disk.
    pub fn workspaces_left(&self) -> usize {
        std::fs::read_dir(self.temp_dir.path().join("workspaces"))
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    pub output_bucket: Option<String>,
    pub untracked_files: UntrackedFilePolicy,
    /// Webhook section reported by `/config`; events always use the mock notifier.
    pub notifier: Option<NotifierConfig>,
}

impl TestConfig {
    /// Config converting files without identifiers.
    pub fn converting_untracked() -> Self {
        Self {
            untracked_files: UntrackedFilePolicy::Convert,
            ..Default::default()
        }
    }
}
