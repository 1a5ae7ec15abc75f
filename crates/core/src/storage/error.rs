//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transferring objects.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The object does not exist.
    #[error("Object not found: gs://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Access to the object or bucket was denied.
    #[error("Permission denied: gs://{bucket}/{key}")]
    PermissionDenied { bucket: String, key: String },

    /// The storage service answered with an unexpected status.
    #[error("Storage request failed with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request could not be sent or the response could not be read.
    #[error("Storage request failed: {0}")]
    Request(String),

    /// No credentials could be obtained.
    #[error("Failed to obtain storage credentials: {0}")]
    Auth(String),

    /// Local file error.
    #[error("Local file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Creates a local I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a non-success HTTP status for an object to an error.
    pub fn from_status(status: u16, bucket: &str, key: &str, message: String) -> Self {
        match status {
            404 => Self::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            401 | 403 => Self::PermissionDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => Self::Http { status, message },
        }
    }
}
