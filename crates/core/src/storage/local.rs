//! Local directory storage backend.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::config::LocalStorageConfig;

use super::error::TransferError;
use super::traits::ObjectStorage;

/// Storage backend where each bucket is a directory under a common root.
///
/// Object keys map to relative paths, so `reports/a.pdf` in bucket `docs`
/// lives at `{root}/docs/reports/a.pdf`.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a new local storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a local storage from configuration.
    pub fn from_config(config: &LocalStorageConfig) -> Self {
        Self::new(config.root.clone())
    }

    /// Resolves an object to its file path, refusing paths that escape the bucket.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, TransferError> {
        let denied = || TransferError::PermissionDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };

        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(denied());
        }

        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(denied());
        }

        Ok(self.root.join(bucket).join(relative))
    }

    fn map_io(bucket: &str, key: &str, path: &Path, e: std::io::Error) -> TransferError {
        match e.kind() {
            std::io::ErrorKind::NotFound => TransferError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => TransferError::PermissionDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => TransferError::io(path, e),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<PathBuf, TransferError> {
        let source = self.object_path(bucket, key)?;
        let bytes = tokio::fs::copy(&source, dest)
            .await
            .map_err(|e| Self::map_io(bucket, key, &source, e))?;

        debug!(bucket, key, bytes, dest = %dest.display(), "Downloaded object");
        Ok(dest.to_path_buf())
    }

    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        _content_type: &str,
    ) -> Result<(), TransferError> {
        let dest = self.object_path(bucket, key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::map_io(bucket, key, parent, e))?;
        }

        let bytes = tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| TransferError::io(source, e))?;

        debug!(bucket, key, bytes, "Uploaded object");
        Ok(())
    }
}
