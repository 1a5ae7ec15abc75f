//! Error types for the rasterizer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while rendering a document.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Rasterizer binary not found.
    #[error("Rasterizer binary not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The process could not be started for another reason.
    #[error("Failed to launch rasterizer: {reason}")]
    LaunchFailed { reason: String },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The rasterizer exited unsuccessfully.
    #[error("Rasterizer exited with code {}: {diagnostics}", display_code(.exit_code))]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    /// The rasterizer reported success but produced no image.
    #[error("Rasterizer produced no output at {path}")]
    OutputMissing { path: PathBuf },

    /// Rendering timed out.
    #[error("Rendering timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while waiting on the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl ConversionError {
    /// Creates a failed-exit error from the process diagnostics.
    pub fn failed(exit_code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::Failed {
            exit_code,
            diagnostics: diagnostics.into(),
        }
    }

    /// Diagnostic output captured from the tool, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Failed { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}
