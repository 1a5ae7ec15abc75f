//! Per-event scratch directories.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Longest prefix of the object key kept in a workspace directory name.
const MAX_TOKEN_LEN: usize = 64;

/// A scratch directory owned by exactly one event.
///
/// `delete` should be awaited on every exit path. If the owning future is
/// dropped first (client disconnect, panic), `Drop` removes the directory
/// synchronously.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    deleted: bool,
}

impl Workspace {
    /// Creates a fresh directory under `root` named after `object_key`.
    pub async fn create(root: &Path, object_key: &str) -> io::Result<Self> {
        let path = root.join(workspace_token(object_key));
        tokio::fs::create_dir_all(&path).await?;
        debug!(path = %path.display(), "Created workspace");

        Ok(Self {
            path,
            deleted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Removes the directory and everything in it. Safe to call more than once.
    pub async fn delete(&mut self) {
        if self.deleted {
            return;
        }
        delete_workspace(&self.path).await;
        self.deleted = true;
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.deleted {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed abandoned workspace"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove abandoned workspace"),
        }
    }
}

/// Directory name for a key: unsafe characters become `_`, then a random suffix.
pub fn workspace_token(object_key: &str) -> String {
    let safe: String = object_key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TOKEN_LEN)
        .collect();

    format!("{}-{}", safe, Uuid::new_v4().simple())
}

/// Recursively removes `path`. Missing or partially written directories are
/// fine; other failures are logged and swallowed.
pub async fn delete_workspace(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(path = %path.display(), "Deleted workspace"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Workspace already gone");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete workspace"),
    }
}
