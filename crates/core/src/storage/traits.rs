//! Trait definitions for the storage module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::TransferError;

/// Object storage used to fetch source documents and publish rendered images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Returns the name of this storage implementation.
    fn name(&self) -> &str;

    /// Downloads `bucket/key` into the local file `dest`.
    ///
    /// Returns the path written.
    async fn download(&self, bucket: &str, key: &str, dest: &Path)
        -> Result<PathBuf, TransferError>;

    /// Uploads the local file `source` to `bucket/key`, replacing any existing object.
    async fn upload(
        &self,
        source: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<(), TransferError>;
}
