//! Mock rasterizer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::rasterizer::{image_path_for, ConversionError, Rasterizer, RenderOptions, RenderOutput};

/// Bytes written as the "rendered" image.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock render";

/// A recorded render for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRender {
    pub input: PathBuf,
    pub options: RenderOptions,
    /// Whether the input existed when the render was requested.
    pub input_existed: bool,
}

/// Mock implementation of the Rasterizer trait.
///
/// Writes `FAKE_PNG` next to the input instead of running an engine.
#[derive(Debug, Default)]
pub struct MockRasterizer {
    renders: Arc<RwLock<Vec<RecordedRender>>>,
    next_error: Arc<RwLock<Option<ConversionError>>>,
}

impl MockRasterizer {
    /// Create a new mock rasterizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded renders.
    pub async fn renders(&self) -> Vec<RecordedRender> {
        self.renders.read().await.clone()
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: ConversionError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(
        &self,
        input: &Path,
        options: &RenderOptions,
    ) -> Result<RenderOutput, ConversionError> {
        let input_existed = tokio::fs::try_exists(input).await.unwrap_or(false);
        self.renders.write().await.push(RecordedRender {
            input: input.to_path_buf(),
            options: *options,
            input_existed,
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if !input_existed {
            return Err(ConversionError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let output_path = image_path_for(input);
        tokio::fs::write(&output_path, FAKE_PNG).await?;

        Ok(RenderOutput {
            output_path,
            size_bytes: FAKE_PNG.len() as u64,
            duration_ms: 1,
        })
    }

    async fn validate(&self) -> Result<(), ConversionError> {
        Ok(())
    }
}
