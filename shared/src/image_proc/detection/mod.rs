//! Source regions and the catalogs that hold them.
//!
//! - **aabb**: integer pixel boxes and points in parent coordinates
//! - **footprint**: light and heavy footprints built from horizontal spans
//! - **catalog**: ordered source records, heavy upgrades and position lookup

pub mod aabb;
pub mod catalog;
pub mod footprint;

pub use aabb::{BBox, Point2D, Point2I};
pub use catalog::{make_heavy_catalog, search_catalog, SourceCatalog, SourceRecord};
pub use footprint::{Footprint, HeavyFootprint, SourceFootprint, Span};
