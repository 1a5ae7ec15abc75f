//! Transfer byte accounting.
//!
//! Kept in its own test binary: the counters are process-wide, so no other
//! test may move them while the deltas are measured.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use pngflow_core::{
    config::PipelineConfig,
    items::{CompletionAggregator, OrderItemRecord},
    metrics::{STAGE_FAILURES, TRANSFER_BYTES},
    pipeline::{ConversionEvent, EventOutcome, EventPipeline, Stage, TriggerSource},
    rasterizer::RenderOptions,
    storage::TransferError,
    testing::{MockItemStore, MockRasterizer, MockStorage, FAKE_PNG},
    UntrackedFilePolicy,
};

const BUCKET: &str = "pdf-to-png";
const PDF: &[u8] = b"%PDF-1.4 metrics";

fn upload_bytes() -> u64 {
    TRANSFER_BYTES.with_label_values(&["upload"]).get()
}

fn download_bytes() -> u64 {
    TRANSFER_BYTES.with_label_values(&["download"]).get()
}

#[tokio::test]
async fn test_upload_bytes_counted_only_after_successful_upload() {
    let workspace_root = TempDir::new().unwrap();
    let storage = Arc::new(MockStorage::new());
    let items = Arc::new(MockItemStore::new());
    items.insert(OrderItemRecord::new("I1", "O1", "approved")).await;
    storage.put_object(BUCKET, "case(O1)(I1).pdf", PDF).await;

    let pipeline = EventPipeline::new(
        PipelineConfig {
            workspace_root: workspace_root.path().to_path_buf(),
            output_bucket: None,
            untracked_files: UntrackedFilePolicy::Reject,
        },
        storage.clone(),
        Arc::new(MockRasterizer::new()),
        RenderOptions::default(),
        CompletionAggregator::new(items, "approved"),
    );
    let event = ConversionEvent::from_object(
        json!({ "bucket": BUCKET, "name": "case(O1)(I1).pdf" }),
        TriggerSource::Direct,
    )
    .unwrap();

    let uploaded_before = upload_bytes();
    let downloaded_before = download_bytes();
    storage
        .set_next_upload_error(TransferError::Http {
            status: 503,
            message: "unavailable".to_string(),
        })
        .await;

    let report = pipeline.handle(&event).await;
    assert!(matches!(
        report.outcome,
        EventOutcome::Failed {
            stage: Stage::Upload,
            ..
        }
    ));
    assert_eq!(upload_bytes(), uploaded_before);
    assert_eq!(download_bytes(), downloaded_before + PDF.len() as u64);
    assert!(STAGE_FAILURES.with_label_values(&["upload"]).get() >= 1);

    let report = pipeline.handle(&event).await;
    assert!(matches!(report.outcome, EventOutcome::Converted { .. }));
    assert_eq!(upload_bytes(), uploaded_before + FAKE_PNG.len() as u64);
}
