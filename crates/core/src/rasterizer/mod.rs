//! Rasterizer module for rendering PDF documents to PNG images.
//!
//! Rendering is delegated to an external tool (Ghostscript by default) behind
//! the `Rasterizer` trait, so tests and alternative engines can be swapped in.
//!
//! The output profile (colour depth and resolution) is fixed when the
//! rasterizer is configured; callers pass the same `RenderOptions` for every
//! document.
//!
//! # Example
//!
//! ```ignore
//! use pngflow_core::rasterizer::{GhostscriptRasterizer, Rasterizer, RenderOptions};
//!
//! let rasterizer = GhostscriptRasterizer::with_defaults();
//! rasterizer.validate().await?;
//!
//! let options = RenderOptions::from(rasterizer.config());
//! let output = rasterizer.render(Path::new("/tmp/ws/case(O1)(I1).pdf"), &options).await?;
//! println!("Rendered {:?} in {} ms", output.output_path, output.duration_ms);
//! ```

mod config;
mod error;
mod ghostscript;
mod traits;
mod types;

pub use config::RasterizerConfig;
pub use error::ConversionError;
pub use ghostscript::GhostscriptRasterizer;
pub use traits::Rasterizer;
pub use types::{image_path_for, ColorDepth, RenderOptions, RenderOutput};
