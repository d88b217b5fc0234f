use thiserror::Error;

use crate::image_proc::detection::BBox;

/// Errors produced by image planes, footprints and display scaling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Input rejected before any computation was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A bounding box with negative width or height.
    #[error("invalid bounding box: {0:?}")]
    InvalidBBox(BBox),

    /// Requested region is not fully contained in the source image.
    #[error("region {inner:?} is not contained in {outer:?}")]
    OutOfBounds {
        /// Requested region.
        inner: BBox,
        /// Region actually covered by the image.
        outer: BBox,
    },

    /// Image, mask and variance planes disagree on their bounding box.
    #[error("plane {plane} has box {found:?}, expected {expected:?}")]
    MisalignedPlanes {
        /// Name of the offending plane.
        plane: &'static str,
        /// Box of the image plane.
        expected: BBox,
        /// Box of the offending plane.
        found: BBox,
    },

    /// Array shape does not match the box it is attached to.
    #[error("array shape {found:?} does not match box size {expected:?}")]
    ShapeMismatch {
        /// (height, width) implied by the box.
        expected: (usize, usize),
        /// (height, width) of the array.
        found: (usize, usize),
    },

    /// Footprint without any spans.
    #[error("footprint has no pixels")]
    EmptyFootprint,

    /// A point coordinate that cannot be represented.
    #[error("point ({x}, {y}) has non-finite coordinates")]
    NonFinitePoint {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
}

/// Result alias for the shared crate.
pub type Result<T> = std::result::Result<T, ImageError>;
