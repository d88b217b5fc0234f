//! Image planes and source regions for difference-image inspection.
//!
//! # Module Organization
//!
//! - **image**: image, mask and variance planes, masked images and exposures,
//!   plus the capability traits the display layer is written against
//! - **psf**: point-spread-function models that render their own stamp
//! - **detection**: bounding boxes, footprints and source catalogs
//! - **zscale**: robust display-range estimation
//! - **dipole**: synthetic dipole scenes for testing and demos

pub mod detection;
pub mod dipole;
pub mod image;
pub mod psf;
pub mod zscale;

pub use detection::{
    make_heavy_catalog, search_catalog, BBox, Footprint, HeavyFootprint, Point2D, Point2I,
    SourceCatalog, SourceFootprint, SourceRecord, Span,
};
pub use dipole::{DipoleSceneConfig, DipoleSpec, DipoleTestImage};
pub use self::image::{
    array_to_gray_image, mask_planes, Exposure, HasArrayAndBBox, HasMaskedImageAndPsf,
    HasThreePlanesAndBBox, Image, Mask, MaskedImage, Plane,
};
pub use psf::{GaussianPsf, Psf};
pub use zscale::{zscale, zscale_samples, DisplayRange, DEFAULT_CONTRAST};
