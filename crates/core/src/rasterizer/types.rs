//! Types for the rasterizer module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::config::RasterizerConfig;

/// Colour depth of the rendered image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorDepth {
    /// 8-bit palette.
    Indexed,
    /// 24-bit RGB.
    #[default]
    TrueColor,
}

impl ColorDepth {
    /// Ghostscript output device for this depth.
    pub fn gs_device(&self) -> &'static str {
        match self {
            ColorDepth::Indexed => "png256",
            ColorDepth::TrueColor => "png16m",
        }
    }
}

/// Fixed output profile applied to every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub color: ColorDepth,
    pub dpi: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RasterizerConfig::default())
    }
}

impl From<&RasterizerConfig> for RenderOptions {
    fn from(config: &RasterizerConfig) -> Self {
        Self {
            color: config.color,
            dpi: config.dpi,
        }
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Path of the rendered image.
    pub output_path: PathBuf,
    /// Size of the rendered image in bytes.
    pub size_bytes: u64,
    /// Time spent rendering in milliseconds.
    pub duration_ms: u64,
}

/// Image path for a given document: same directory and stem, `png` extension.
pub fn image_path_for(input: &Path) -> PathBuf {
    input.with_extension("png")
}
