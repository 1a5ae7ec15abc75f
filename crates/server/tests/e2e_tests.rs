//! End-to-end tests with mocked collaborators.
//!
//! These tests run the full router in-process with mock implementations of
//! storage, rasterizer, item store and webhook.

mod common;

use axum::http::StatusCode;
use pngflow_core::config::NotifierConfig;
use pngflow_core::items::OrderItemRecord;
use pngflow_core::storage::TransferError;
use pngflow_core::testing::FAKE_PNG;
use serde_json::json;

use common::{fixtures, TestConfig, TestFixture};

const BUCKET: &str = "pdf-to-png";

// =============================================================================
// Operational endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["storage"]["backend"], "local");
    assert_eq!(response.body["pipeline"]["untracked_files"], "reject");
}

#[tokio::test]
async fn test_config_endpoint_hides_webhook_url() {
    let fixture = TestFixture::with_config(TestConfig {
        notifier: Some(NotifierConfig {
            url: "https://hooks.example.com/trigger/abc123secret".to_string(),
            workflow_id: "wf-7".to_string(),
            dashboard_id: "dash-42".to_string(),
            exactly_once: true,
            timeout_secs: 30,
        }),
        ..Default::default()
    })
    .await;

    let response = fixture.get("/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["notifier"]["host"], "hooks.example.com");
    assert_eq!(response.body["notifier"]["exactly_once"], true);
    assert!(!response.text.contains("abc123secret"));
    assert!(!response.text.contains("wf-7"));
    assert!(!response.text.contains("dash-42"));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_event_counters() {
    let fixture = TestFixture::new().await;
    fixture
        .post("/events/storage", fixtures::object_descriptor(BUCKET, "notes.txt"))
        .await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("pngflow_events_total"));
    assert!(response.text.contains("pngflow_http_requests_total"));
}

// =============================================================================
// Push trigger
// =============================================================================

#[tokio::test]
async fn test_push_converts_and_notifies() {
    let fixture = TestFixture::with_config(TestConfig {
        output_bucket: Some("rendered".to_string()),
        ..Default::default()
    })
    .await;
    fixture
        .storage
        .put_object(BUCKET, "case(O100)(I1).pdf", b"%PDF-1.4")
        .await;
    fixture
        .items
        .insert(OrderItemRecord::new("I1", "O100", "approved"))
        .await;

    let envelope = fixtures::push_envelope(&fixtures::object_descriptor(BUCKET, "case(O100)(I1).pdf"));
    let response = fixture.post("/pubsub/push", envelope).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "converted");
    assert_eq!(response.body["output_bucket"], "rendered");
    assert_eq!(response.body["output_key"], "case(O100)(I1).png");
    assert_eq!(response.body["aggregation"]["status"], "notified");
    assert_eq!(response.body["message_id"], "1234567890");

    assert_eq!(
        fixture.storage.object("rendered", "case(O100)(I1).png").await.as_deref(),
        Some(FAKE_PNG)
    );
    assert!(fixture.items.get("I1").await.unwrap().png_extracted);
    assert_eq!(fixture.notifier.notified_orders().await, vec!["O100"]);
    assert_eq!(fixture.workspaces_left(), 0);
}

#[tokio::test]
async fn test_push_on_root_path() {
    let fixture = TestFixture::new().await;
    let envelope = fixtures::push_envelope(&fixtures::object_descriptor(BUCKET, "image.png"));

    let response = fixture.post("/", envelope).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "ignored");
}

#[tokio::test]
async fn test_push_missing_data_is_bad_request_without_side_effects() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/pubsub/push",
            json!({ "message": { "messageId": "1" }, "subscription": "s" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "missing_data");
    assert!(fixture.storage.downloads().await.is_empty());
    assert!(fixture.rasterizer.renders().await.is_empty());
    assert!(fixture.items.marked_items().await.is_empty());
}

#[tokio::test]
async fn test_push_bad_envelopes() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/pubsub/push", json!({ "subscription": "s" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "missing_message");

    let response = fixture
        .post("/pubsub/push", json!({ "message": { "data": "%%%" } }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "invalid_base64");

    let envelope = fixtures::push_envelope(&json!({ "bucket": BUCKET }));
    let response = fixture.post("/pubsub/push", envelope).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "missing_field");

    let response = fixture.post_raw("/pubsub/push", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "invalid_payload");
}

#[tokio::test]
async fn test_push_untracked_name_rejected_by_policy() {
    let fixture = TestFixture::new().await;
    fixture.storage.put_object(BUCKET, "invoice.pdf", b"%PDF").await;

    let envelope = fixtures::push_envelope(&fixtures::object_descriptor(BUCKET, "invoice.pdf"));
    let response = fixture.post("/pubsub/push", envelope).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "rejected");
    assert_eq!(response.body["report"]["outcome"], "rejected");
    assert!(fixture.storage.downloads().await.is_empty());
}

#[tokio::test]
async fn test_push_untracked_name_converted_by_policy() {
    let fixture = TestFixture::with_config(TestConfig::converting_untracked()).await;
    fixture.storage.put_object(BUCKET, "invoice.pdf", b"%PDF").await;

    let envelope = fixtures::push_envelope(&fixtures::object_descriptor(BUCKET, "invoice.pdf"));
    let response = fixture.post("/pubsub/push", envelope).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["aggregation"]["status"], "untracked");
    assert!(fixture.storage.object(BUCKET, "invoice.png").await.is_some());
    assert!(fixture.notifier.notified_orders().await.is_empty());
}

#[tokio::test]
async fn test_push_business_failure_is_acknowledged() {
    let fixture = TestFixture::new().await;
    fixture
        .storage
        .put_object(BUCKET, "case(O1)(I1).pdf", b"%PDF")
        .await;
    fixture
        .items
        .insert(OrderItemRecord::new("I1", "O1", "approved"))
        .await;
    fixture
        .storage
        .set_next_upload_error(TransferError::Http {
            status: 503,
            message: "backend unavailable".to_string(),
        })
        .await;

    let envelope = fixtures::push_envelope(&fixtures::object_descriptor(BUCKET, "case(O1)(I1).pdf"));
    let response = fixture.post("/pubsub/push", envelope).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "failed");
    assert_eq!(response.body["stage"], "upload");
    assert!(!fixture.items.get("I1").await.unwrap().png_extracted);
    assert_eq!(fixture.workspaces_left(), 0);
}

// =============================================================================
// Direct trigger
// =============================================================================

#[tokio::test]
async fn test_direct_event_converts() {
    let fixture = TestFixture::new().await;
    fixture
        .storage
        .put_object(BUCKET, "orders/case(O5)(I9).pdf", b"%PDF")
        .await;
    fixture
        .items
        .insert(OrderItemRecord::new("I9", "O5", "approved"))
        .await;
    fixture
        .items
        .insert(OrderItemRecord::new("I10", "O5", "approved"))
        .await;

    let response = fixture
        .post(
            "/events/storage",
            fixtures::object_descriptor(BUCKET, "orders/case(O5)(I9).pdf"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["trigger"], "direct");
    assert_eq!(response.body["output_key"], "orders/case(O5)(I9).png");
    assert_eq!(response.body["aggregation"]["status"], "incomplete");
    assert!(fixture.notifier.notified_orders().await.is_empty());
}

#[tokio::test]
async fn test_direct_event_acknowledges_unusable_payloads() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/events/storage", json!({ "name": "a.pdf" })).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "rejected");

    let response = fixture
        .post("/events/storage", fixtures::object_descriptor(BUCKET, "invoice.pdf"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "rejected");

    assert!(fixture.storage.downloads().await.is_empty());
}

#[tokio::test]
async fn test_direct_event_rejects_malformed_json() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/events/storage", "[1, 2").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
