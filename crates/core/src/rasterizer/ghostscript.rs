//! Ghostscript-based rasterizer implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::RasterizerConfig;
use super::error::ConversionError;
use super::traits::Rasterizer;
use super::types::{image_path_for, RenderOptions, RenderOutput};

/// Largest amount of tool output kept in an error.
const MAX_DIAGNOSTICS_LEN: usize = 4096;

/// Ghostscript-based rasterizer implementation.
///
/// Renders the first page of a document with the `png16m` or `png256`
/// device. Arguments are passed as a list, so paths containing spaces or
/// parentheses reach Ghostscript unchanged.
pub struct GhostscriptRasterizer {
    config: RasterizerConfig,
}

impl GhostscriptRasterizer {
    /// Creates a new rasterizer with the given configuration.
    pub fn new(config: RasterizerConfig) -> Self {
        Self { config }
    }

    /// Creates a rasterizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RasterizerConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RasterizerConfig {
        &self.config
    }

    /// Builds Ghostscript arguments for a single render.
    fn build_args(input: &Path, output: &Path, options: &RenderOptions) -> Vec<String> {
        vec![
            "-dSAFER".to_string(),
            "-dBATCH".to_string(),
            "-dNOPAUSE".to_string(),
            "-dQUIET".to_string(),
            format!("-sDEVICE={}", options.color.gs_device()),
            format!("-r{}", options.dpi),
            "-dFirstPage=1".to_string(),
            "-dLastPage=1".to_string(),
            // `%` starts a page-number template in OutputFile
            format!(
                "-sOutputFile={}",
                output.to_string_lossy().replace('%', "%%")
            ),
            input.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> ConversionError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConversionError::ToolNotFound {
                path: self.config.gs_path.clone(),
            }
        } else {
            ConversionError::LaunchFailed {
                reason: e.to_string(),
            }
        }
    }

    /// Collects stderr, falling back to stdout (Ghostscript reports some errors there).
    fn diagnostics(stdout: &[u8], stderr: &[u8]) -> String {
        let stderr = String::from_utf8_lossy(stderr);
        let text = if stderr.trim().is_empty() {
            String::from_utf8_lossy(stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        if text.len() > MAX_DIAGNOSTICS_LEN {
            let mut end = MAX_DIAGNOSTICS_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        } else {
            text
        }
    }
}

#[async_trait]
impl Rasterizer for GhostscriptRasterizer {
    fn name(&self) -> &str {
        "ghostscript"
    }

    async fn render(
        &self,
        input: &Path,
        options: &RenderOptions,
    ) -> Result<RenderOutput, ConversionError> {
        let start = Instant::now();

        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(ConversionError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let output_path = image_path_for(input);
        let args = Self::build_args(input, &output_path, options);
        debug!(gs = ?self.config.gs_path, ?args, "Running ghostscript");

        let child = Command::new(&self.config.gs_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Dropping the child on timeout kills it.
        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ConversionError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if !output.status.success() {
            return Err(ConversionError::failed(
                output.status.code(),
                Self::diagnostics(&output.stdout, &output.stderr),
            ));
        }

        let metadata = tokio::fs::metadata(&output_path).await.map_err(|_| {
            ConversionError::OutputMissing {
                path: output_path.clone(),
            }
        })?;

        Ok(RenderOutput {
            output_path,
            size_bytes: metadata.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConversionError> {
        let output = Command::new(&self.config.gs_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConversionError::failed(
                output.status.code(),
                Self::diagnostics(&output.stdout, &output.stderr),
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "Ghostscript available"
        );
        Ok(())
    }
}
