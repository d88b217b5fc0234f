//! Shared data types for inspecting difference-imaging products.
//!
//! Pixel planes, exposures, PSF models, footprints and source catalogs, plus
//! the zscale display-range estimator used by every renderer in the `viz`
//! crate.

pub mod error;
pub mod image_proc;

pub use error::{ImageError, Result};
