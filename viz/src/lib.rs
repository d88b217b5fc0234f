//! Display helpers for inspecting difference-imaging products.
//!
//! These tools are for eyeballing intermediate data while debugging a
//! difference-imaging pipeline: an array with automatically chosen contrast,
//! an exposure next to its mask and variance planes, the PSF stamp, or the
//! pixels of one cataloged source cut out of the difference image and its
//! positive and negative components.
//!
//! # Core Modules
//!
//! ## Figures (`figure`)
//! Backend-independent description of what to draw: panels holding a float
//! array, its zscale display range, title, axis extent and colorbar flag,
//! arranged in a one-row subplot grid.
//!
//! ## Backends (`backend`)
//! The [`backend::RenderBackend`] trait and a plotters implementation that
//! writes each figure to a PNG file.
//!
//! ## Display entry points (`display`)
//! [`display::DisplayContext`] owns an optional backend. Every entry point
//! builds its figure, hands it to the backend and returns it. Without a
//! backend the calls quietly return `None` after logging a single warning, so
//! display code can stay in a pipeline that runs headless.
//!
//! ## Cutouts (`cutout`)
//! Extraction of footprint-sized crops, either rectangular or restricted to
//! the footprint's own pixels.
//!
//! # Usage
//!
//! ```rust
//! use shared::image_proc::{DipoleSceneConfig, DipoleTestImage};
//! use viz::config::DisplayConfig;
//! use viz::display::DisplayContext;
//!
//! let scene = DipoleTestImage::generate(&DipoleSceneConfig::default())?;
//! let ctx = DisplayContext::headless(DisplayConfig::default());
//!
//! // No backend configured: nothing is drawn and nothing fails.
//! let figure = ctx.display_exposure(&scene.diffim, &ctx.options())?;
//! assert!(figure.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use shared::ImageError;
use thiserror::Error;

/// Error types for display operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// Failure inside the image or catalog types being displayed.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// The plotting backend failed to draw or encode a figure.
    #[error("Render error: {0}")]
    Render(String),

    /// Arguments that cannot be displayed, such as too many panels.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// PSF display requested on an exposure without a PSF model.
    #[error("Exposure has no PSF to display")]
    MissingPsf,

    /// Filesystem error while reading configuration or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Standard Result type for display operations.
pub type Result<T> = std::result::Result<T, VizError>;

pub mod backend;
pub mod config;
pub mod cutout;
pub mod display;
pub mod figure;
