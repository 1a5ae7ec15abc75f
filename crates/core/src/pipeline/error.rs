//! Error types for the pipeline module.

use thiserror::Error;

use crate::items::StoreError;
use crate::rasterizer::ConversionError;
use crate::storage::TransferError;

use super::types::Stage;

/// Problems with the event itself. Detected before any side effect.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Push envelope has no message")]
    MissingMessage,

    #[error("Push message has no data")]
    MissingData,

    #[error("Push message data is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("Event payload is not a valid object descriptor: {0}")]
    InvalidPayload(String),

    #[error("Event payload is missing '{0}'")]
    MissingField(&'static str),

    #[error("Not a PDF: {name}")]
    NotPdf { name: String },

    #[error("File name has no (order)(item) identifiers: {name}")]
    UntrackedFilename { name: String },
}

impl InputError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InputError::MissingMessage => "missing_message",
            InputError::MissingData => "missing_data",
            InputError::InvalidBase64(_) => "invalid_base64",
            InputError::InvalidPayload(_) => "invalid_payload",
            InputError::MissingField(_) => "missing_field",
            InputError::NotPdf { .. } => "not_pdf",
            InputError::UntrackedFilename { .. } => "untracked_filename",
        }
    }

    /// Whether the event is simply out of scope, as opposed to malformed.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, InputError::NotPdf { .. })
    }
}

/// A failure after the event was accepted. Cleanup has still run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(#[source] TransferError),

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Upload failed: {0}")]
    Upload(#[source] TransferError),

    #[error("Tracking update failed: {0}")]
    Tracking(#[from] StoreError),
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Workspace(_) => Stage::Workspace,
            PipelineError::Download(_) => Stage::Download,
            PipelineError::Conversion(_) => Stage::Conversion,
            PipelineError::Upload(_) => Stage::Upload,
            PipelineError::Tracking(_) => Stage::Tracking,
        }
    }
}
