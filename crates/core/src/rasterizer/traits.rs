//! Trait definitions for the rasterizer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConversionError;
use super::types::{RenderOptions, RenderOutput};

/// A rasterizer that renders a PDF document to a PNG image.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Returns the name of this rasterizer implementation.
    fn name(&self) -> &str;

    /// Renders `input` next to itself with a `png` extension.
    ///
    /// Completes only when the underlying engine reports success and the
    /// image exists on disk.
    async fn render(
        &self,
        input: &Path,
        options: &RenderOptions,
    ) -> Result<RenderOutput, ConversionError>;

    /// Validates that the rasterizer is properly configured and ready.
    async fn validate(&self) -> Result<(), ConversionError>;
}
