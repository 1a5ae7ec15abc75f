//! Testing utilities and mock implementations.
//!
//! This module provides in-memory implementations of every collaborator
//! trait, so the pipeline can be exercised end to end without cloud
//! services or a Ghostscript install.
//!
//! # Example
//!
//! ```rust,ignore
//! use pngflow_core::testing::{MockItemStore, MockNotifier, MockRasterizer, MockStorage};
//!
//! let storage = Arc::new(MockStorage::new());
//! let items = Arc::new(MockItemStore::new());
//!
//! storage.put_object("pdf-to-png", "case(O100)(I1).pdf", b"%PDF-1.4").await;
//! items.insert(OrderItemRecord::new("I1", "O100", "approved")).await;
//!
//! // Build an EventPipeline from the mocks...
//! ```

mod mock_item_store;
mod mock_notifier;
mod mock_rasterizer;
mod mock_storage;

pub use mock_item_store::MockItemStore;
pub use mock_notifier::MockNotifier;
pub use mock_rasterizer::{MockRasterizer, RecordedRender, FAKE_PNG};
pub use mock_storage::{MockStorage, RecordedTransfer};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::config::{
        Config, ItemStoreBackendKind, ItemStoreConfig, LocalStorageConfig, PipelineConfig,
        SqliteConfig, StorageBackendKind, StorageConfig,
    };

    /// An object-finalize descriptor as sent by storage notifications.
    pub fn object_descriptor(bucket: &str, name: &str) -> Value {
        json!({
            "kind": "storage#object",
            "bucket": bucket,
            "name": name,
            "contentType": "application/pdf",
            "size": "2048"
        })
    }

    /// A push envelope wrapping `payload` as base64 JSON.
    pub fn push_envelope(payload: &Value) -> Value {
        use base64::Engine;

        json!({
            "message": {
                "data": base64::engine::general_purpose::STANDARD.encode(payload.to_string()),
                "attributes": { "eventType": "OBJECT_FINALIZE" },
                "messageId": "1234567890"
            },
            "subscription": "projects/test/subscriptions/pdf-to-png"
        })
    }

    /// A config using local storage and an in-memory SQLite store.
    pub fn local_config(pipeline: PipelineConfig) -> Config {
        Config {
            server: Default::default(),
            pipeline,
            rasterizer: Default::default(),
            storage: StorageConfig {
                backend: StorageBackendKind::Local,
                gcs: None,
                local: Some(LocalStorageConfig {
                    root: std::env::temp_dir().join("pngflow-buckets"),
                }),
            },
            item_store: ItemStoreConfig {
                backend: ItemStoreBackendKind::Sqlite,
                approved_status: "approved".to_string(),
                realtime_db: None,
                sqlite: SqliteConfig {
                    path: ":memory:".into(),
                },
            },
            notifier: None,
        }
    }
}
