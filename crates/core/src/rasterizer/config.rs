//! Configuration for the rasterizer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::ColorDepth;

/// Configuration for the Ghostscript-based rasterizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizerConfig {
    /// Path to the Ghostscript binary.
    #[serde(default = "default_gs_path")]
    pub gs_path: PathBuf,

    /// Output resolution in dots per inch.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Output colour depth.
    #[serde(default)]
    pub color: ColorDepth,

    /// Timeout for a single render in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_gs_path() -> PathBuf {
    PathBuf::from("gs")
}

fn default_dpi() -> u32 {
    300
}

fn default_timeout() -> u64 {
    300
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            gs_path: default_gs_path(),
            dpi: default_dpi(),
            color: ColorDepth::default(),
            timeout_secs: default_timeout(),
        }
    }
}

impl RasterizerConfig {
    /// Creates a new config with a custom Ghostscript path.
    pub fn with_gs_path(gs_path: PathBuf) -> Self {
        Self {
            gs_path,
            ..Default::default()
        }
    }

    /// Sets the output resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Sets the output colour depth.
    pub fn with_color(mut self, color: ColorDepth) -> Self {
        self.color = color;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
