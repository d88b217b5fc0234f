//! Pixel planes placed in parent-image coordinates.
//!
//! An [`Image`] is an `ndarray` plane plus the [`BBox`] it occupies in a larger
//! mosaic. Array index `[row, col]` maps to parent pixel
//! `(min_x + col, min_y + row)`, so row 0 is the *bottom* of the displayed
//! image once rendered with a lower-left origin.
//!
//! [`MaskedImage`] bundles image, mask and variance planes that share one box,
//! and [`Exposure`] adds an optional PSF model. The capability traits at the end
//! of this module are the only view the display layer has of these types.

use image::{GrayImage, Luma};
use ndarray::{s, Array2, ArrayView2, ArrayViewMut2};

use crate::error::{ImageError, Result};
use crate::image_proc::detection::{BBox, Point2I};
use crate::image_proc::psf::Psf;
use crate::image_proc::zscale::DisplayRange;

/// A 2-D plane of pixels anchored in parent coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    bbox: BBox,
    array: Array2<T>,
}

/// Floating-point science or variance plane.
pub type Image = Plane<f32>;

/// Bit-plane mask.
pub type Mask = Plane<u32>;

/// Named mask bits.
pub mod mask_planes {
    pub const BAD: u32 = 1 << 0;
    pub const SAT: u32 = 1 << 1;
    pub const INTRP: u32 = 1 << 2;
    pub const CR: u32 = 1 << 3;
    pub const EDGE: u32 = 1 << 4;
    pub const DETECTED: u32 = 1 << 5;
    pub const DETECTED_NEGATIVE: u32 = 1 << 6;
}

impl<T: Clone> Plane<T> {
    /// Create a plane covering `bbox`, every pixel set to `fill`.
    pub fn new(bbox: BBox, fill: T) -> Result<Self> {
        let bbox = bbox.validated()?;
        Ok(Self {
            bbox,
            array: Array2::from_elem(bbox.dim(), fill),
        })
    }

    /// Wrap an array whose `[0, 0]` element sits at `corner`.
    pub fn from_array(corner: Point2I, array: Array2<T>) -> Self {
        let (rows, cols) = array.dim();
        Self {
            bbox: BBox::from_corner_size(corner, cols, rows),
            array,
        }
    }

    /// Wrap an array, checking that its shape matches `bbox`.
    pub fn with_bbox(bbox: BBox, array: Array2<T>) -> Result<Self> {
        if array.dim() != bbox.dim() {
            return Err(ImageError::ShapeMismatch {
                expected: bbox.dim(),
                found: array.dim(),
            });
        }
        Ok(Self { bbox, array })
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn array(&self) -> ArrayView2<'_, T> {
        self.array.view()
    }

    pub fn array_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.array.view_mut()
    }

    pub fn into_array(self) -> Array2<T> {
        self.array
    }

    /// Pixel value at parent coordinate `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        let (row, col) = self.bbox.local_index(x, y)?;
        self.array.get((row, col))
    }

    /// Mutable pixel at parent coordinate `(x, y)`.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        let (row, col) = self.bbox.local_index(x, y)?;
        self.array.get_mut((row, col))
    }

    /// Copy out the rectangle `bbox`, given in parent coordinates.
    pub fn subimage(&self, bbox: BBox) -> Result<Self> {
        let bbox = bbox.validated()?;
        if !self.bbox.contains(&bbox) {
            return Err(ImageError::OutOfBounds {
                inner: bbox,
                outer: self.bbox,
            });
        }

        let row0 = (bbox.min_y - self.bbox.min_y) as usize;
        let col0 = (bbox.min_x - self.bbox.min_x) as usize;
        let (rows, cols) = bbox.dim();
        let array = self
            .array
            .slice(s![row0..row0 + rows, col0..col0 + cols])
            .to_owned();

        Ok(Self { bbox, array })
    }
}

impl Mask {
    /// OR `bits` into the pixel at `(x, y)`. Pixels outside the mask are ignored.
    pub fn set_bits(&mut self, x: i32, y: i32, bits: u32) {
        if let Some(value) = self.get_mut(x, y) {
            *value |= bits;
        }
    }

    /// Mask bits as floating-point values for display.
    pub fn to_f32_array(&self) -> Array2<f32> {
        self.array.mapv(|bits| bits as f32)
    }
}

/// Image, mask and variance planes sharing one bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    image: Image,
    mask: Mask,
    variance: Image,
}

impl MaskedImage {
    /// Bundle three planes, rejecting them unless they cover the same box.
    pub fn new(image: Image, mask: Mask, variance: Image) -> Result<Self> {
        let expected = image.bbox();
        if mask.bbox() != expected {
            return Err(ImageError::MisalignedPlanes {
                plane: "mask",
                expected,
                found: mask.bbox(),
            });
        }
        if variance.bbox() != expected {
            return Err(ImageError::MisalignedPlanes {
                plane: "variance",
                expected,
                found: variance.bbox(),
            });
        }
        Ok(Self {
            image,
            mask,
            variance,
        })
    }

    /// Zero image and mask with unit variance.
    pub fn from_bbox(bbox: BBox) -> Result<Self> {
        Self::new(
            Image::new(bbox, 0.0)?,
            Mask::new(bbox, 0)?,
            Image::new(bbox, 1.0)?,
        )
    }

    pub fn bbox(&self) -> BBox {
        self.image.bbox()
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut Image {
        &mut self.image
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }

    pub fn variance(&self) -> &Image {
        &self.variance
    }

    pub fn variance_mut(&mut self) -> &mut Image {
        &mut self.variance
    }

    /// Copy out all three planes at `bbox`.
    pub fn subimage(&self, bbox: BBox) -> Result<Self> {
        Ok(Self {
            image: self.image.subimage(bbox)?,
            mask: self.mask.subimage(bbox)?,
            variance: self.variance.subimage(bbox)?,
        })
    }
}

/// A masked image with an optional point-spread-function model.
#[derive(Debug)]
pub struct Exposure {
    masked_image: MaskedImage,
    psf: Option<Box<dyn Psf>>,
}

impl Exposure {
    pub fn new(masked_image: MaskedImage) -> Self {
        Self {
            masked_image,
            psf: None,
        }
    }

    pub fn with_psf(mut self, psf: Box<dyn Psf>) -> Self {
        self.psf = Some(psf);
        self
    }

    pub fn masked_image(&self) -> &MaskedImage {
        &self.masked_image
    }

    pub fn masked_image_mut(&mut self) -> &mut MaskedImage {
        &mut self.masked_image
    }

    pub fn psf(&self) -> Option<&dyn Psf> {
        self.psf.as_deref()
    }

    pub fn bbox(&self) -> BBox {
        self.masked_image.bbox()
    }
}

/// Anything that can hand out one float plane and the box it occupies.
pub trait HasArrayAndBBox {
    fn bbox(&self) -> BBox;
    fn array(&self) -> ArrayView2<'_, f32>;
}

/// Anything with aligned data, mask and variance planes.
pub trait HasThreePlanesAndBBox {
    fn bbox(&self) -> BBox;
    fn image_array(&self) -> ArrayView2<'_, f32>;
    /// Mask bits converted for display.
    fn mask_array(&self) -> Array2<f32>;
    fn variance_array(&self) -> ArrayView2<'_, f32>;
}

/// Anything exposing a masked image and possibly a PSF model.
pub trait HasMaskedImageAndPsf {
    fn masked_image(&self) -> &MaskedImage;
    fn psf(&self) -> Option<&dyn Psf>;
}

impl HasArrayAndBBox for Image {
    fn bbox(&self) -> BBox {
        Plane::bbox(self)
    }

    fn array(&self) -> ArrayView2<'_, f32> {
        Plane::array(self)
    }
}

impl HasThreePlanesAndBBox for MaskedImage {
    fn bbox(&self) -> BBox {
        MaskedImage::bbox(self)
    }

    fn image_array(&self) -> ArrayView2<'_, f32> {
        self.image.array()
    }

    fn mask_array(&self) -> Array2<f32> {
        self.mask.to_f32_array()
    }

    fn variance_array(&self) -> ArrayView2<'_, f32> {
        self.variance.array()
    }
}

impl HasMaskedImageAndPsf for Exposure {
    fn masked_image(&self) -> &MaskedImage {
        Exposure::masked_image(self)
    }

    fn psf(&self) -> Option<&dyn Psf> {
        Exposure::psf(self)
    }
}

/// Convert a float plane to an 8-bit grayscale image clipped to `range`.
///
/// Row 0 of the array is written to the bottom row of the image so the output
/// has the same lower-left origin as the rendered panels. NaN pixels become 0.
pub fn array_to_gray_image(arr: &ArrayView2<f32>, range: DisplayRange) -> GrayImage {
    let (height, width) = arr.dim();
    let mut img = GrayImage::new(width as u32, height as u32);

    for ((row, col), &value) in arr.indexed_iter() {
        let level = if value.is_nan() {
            0
        } else {
            (range.normalize(value as f64) * 255.0).round() as u8
        };
        img.put_pixel(col as u32, (height - 1 - row) as u32, Luma([level]));
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_proc::psf::GaussianPsf;
    use ndarray::array;

    fn ramp_image() -> Image {
        let array = Array2::from_shape_fn((4, 5), |(r, c)| (r * 10 + c) as f32);
        Image::from_array(Point2I::new(100, 200), array)
    }

    #[test]
    fn test_from_array_sets_bbox() {
        let image = ramp_image();
        assert_eq!(image.bbox(), BBox::from_coords(100, 200, 104, 203));
        assert_eq!(image.get(100, 200), Some(&0.0));
        assert_eq!(image.get(104, 203), Some(&34.0));
        assert_eq!(image.get(105, 203), None);
    }

    #[test]
    fn test_with_bbox_checks_shape() {
        let bbox = BBox::from_coords(0, 0, 2, 1);
        assert!(Image::with_bbox(bbox, Array2::zeros((2, 3))).is_ok());
        assert_eq!(
            Image::with_bbox(bbox, Array2::zeros((3, 2))),
            Err(ImageError::ShapeMismatch {
                expected: (2, 3),
                found: (3, 2)
            })
        );
    }

    #[test]
    fn test_new_rejects_invalid_box() {
        assert!(Image::new(BBox::empty(), 0.0).is_err());
    }

    #[test]
    fn test_subimage_uses_parent_coordinates() {
        let image = ramp_image();
        let sub = image.subimage(BBox::from_coords(101, 201, 103, 202)).unwrap();
        assert_eq!(sub.bbox(), BBox::from_coords(101, 201, 103, 202));
        assert_eq!(sub.array(), array![[11.0, 12.0, 13.0], [21.0, 22.0, 23.0]]);
    }

    #[test]
    fn test_subimage_out_of_bounds() {
        let image = ramp_image();
        let result = image.subimage(BBox::from_coords(99, 200, 101, 201));
        assert!(matches!(result, Err(ImageError::OutOfBounds { .. })));
    }

    #[test]
    fn test_mask_bits() {
        let mut mask = Mask::new(BBox::from_coords(0, 0, 2, 2), 0).unwrap();
        mask.set_bits(1, 1, mask_planes::DETECTED);
        mask.set_bits(1, 1, mask_planes::SAT);
        mask.set_bits(5, 5, mask_planes::BAD);
        assert_eq!(
            mask.get(1, 1),
            Some(&(mask_planes::DETECTED | mask_planes::SAT))
        );
        assert_eq!(mask.to_f32_array()[[1, 1]], 34.0);
    }

    #[test]
    fn test_masked_image_alignment() {
        let bbox = BBox::from_coords(0, 0, 3, 3);
        let other = BBox::from_coords(1, 0, 4, 3);
        let result = MaskedImage::new(
            Image::new(bbox, 0.0).unwrap(),
            Mask::new(other, 0).unwrap(),
            Image::new(bbox, 1.0).unwrap(),
        );
        assert!(matches!(
            result,
            Err(ImageError::MisalignedPlanes { plane: "mask", .. })
        ));

        let result = MaskedImage::new(
            Image::new(bbox, 0.0).unwrap(),
            Mask::new(bbox, 0).unwrap(),
            Image::new(other, 1.0).unwrap(),
        );
        assert!(matches!(
            result,
            Err(ImageError::MisalignedPlanes {
                plane: "variance",
                ..
            })
        ));
    }

    #[test]
    fn test_three_plane_trait() {
        let mut mi = MaskedImage::from_bbox(BBox::from_coords(0, 0, 1, 1)).unwrap();
        *mi.image_mut().get_mut(1, 0).unwrap() = 5.0;
        mi.mask_mut().set_bits(0, 1, mask_planes::CR);
        assert_eq!(mi.image_array()[[0, 1]], 5.0);
        assert_eq!(mi.mask_array()[[1, 0]], mask_planes::CR as f32);
        assert_eq!(mi.variance_array()[[1, 1]], 1.0);
    }

    #[test]
    fn test_exposure_psf_optional() {
        let mi = MaskedImage::from_bbox(BBox::from_coords(0, 0, 9, 9)).unwrap();
        let exposure = Exposure::new(mi);
        assert!(exposure.psf().is_none());

        let exposure = exposure.with_psf(Box::new(GaussianPsf::new(1.5, 11).unwrap()));
        assert!(exposure.psf().is_some());
    }

    #[test]
    fn test_gray_image_has_lower_left_origin() {
        let arr = array![[0.0f32, 10.0], [f32::NAN, 5.0]];
        let range = DisplayRange {
            low: 0.0,
            high: 10.0,
        };
        let img = array_to_gray_image(&arr.view(), range);
        assert_eq!(img.dimensions(), (2, 2));
        // Array row 0 lands on the bottom image row.
        assert_eq!(img.get_pixel(0, 1)[0], 0);
        assert_eq!(img.get_pixel(1, 1)[0], 255);
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 128);
    }
}
