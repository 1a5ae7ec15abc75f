//! Mock object storage for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ObjectStorage, TransferError};

/// A recorded transfer for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub bucket: String,
    pub key: String,
    /// Content type passed to `upload`; `None` for downloads.
    pub content_type: Option<String>,
}

/// In-memory implementation of the ObjectStorage trait.
///
/// Objects live in a map keyed by `(bucket, key)`. Downloads write the stored
/// bytes to the destination path; uploads read the source file back in.
///
/// # Example
///
/// ```rust,ignore
/// use pngflow_core::testing::MockStorage;
///
/// let storage = MockStorage::new();
/// storage.put_object("pdf-to-png", "case(O1)(I1).pdf", b"%PDF-1.4").await;
///
/// // ... run the pipeline ...
///
/// assert!(storage.object("pdf-to-png", "case(O1)(I1).png").await.is_some());
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
    downloads: Arc<RwLock<Vec<RecordedTransfer>>>,
    uploads: Arc<RwLock<Vec<RecordedTransfer>>>,
    next_download_error: Arc<RwLock<Option<TransferError>>>,
    next_upload_error: Arc<RwLock<Option<TransferError>>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly.
    pub async fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
    }

    /// Get a stored object.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// All downloads attempted, in order.
    pub async fn downloads(&self) -> Vec<RecordedTransfer> {
        self.downloads.read().await.clone()
    }

    /// All uploads attempted, in order.
    pub async fn uploads(&self) -> Vec<RecordedTransfer> {
        self.uploads.read().await.clone()
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_download_error(&self, error: TransferError) {
        *self.next_download_error.write().await = Some(error);
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_upload_error(&self, error: TransferError) {
        *self.next_upload_error.write().await = Some(error);
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<PathBuf, TransferError> {
        self.downloads.write().await.push(RecordedTransfer {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: None,
        });

        if let Some(err) = self.next_download_error.write().await.take() {
            return Err(err);
        }

        let bytes = self
            .object(bucket, key)
            .await
            .ok_or_else(|| TransferError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        tokio::fs::write(dest, bytes)
            .await
            .map_err(|e| TransferError::io(dest, e))?;
        Ok(dest.to_path_buf())
    }

    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<(), TransferError> {
        self.uploads.write().await.push(RecordedTransfer {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: Some(content_type.to_string()),
        });

        if let Some(err) = self.next_upload_error.write().await.take() {
            return Err(err);
        }

        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| TransferError::io(source, e))?;
        self.put_object(bucket, key, &bytes).await;
        Ok(())
    }
}
