//! Footprints: irregular pixel regions belonging to one detected source.
//!
//! A light [`Footprint`] only records which pixels belong to the source, as a
//! sorted list of horizontal spans. A [`HeavyFootprint`] additionally carries
//! the image, mask and variance values of those pixels, copied in span order,
//! so the source can be redrawn without the exposure it came from.

use ndarray::ArrayViewMut2;
use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};
use crate::image_proc::detection::{BBox, Point2I};
use crate::image_proc::image::{Image, MaskedImage};

/// Run of pixels `x0..=x1` on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

impl Span {
    pub fn new(y: i32, x0: i32, x1: i32) -> Self {
        Self { y, x0, x1 }
    }

    pub fn width(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        y == self.y && x >= self.x0 && x <= self.x1
    }
}

/// Set of pixels making up one source, without pixel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    spans: Vec<Span>,
    bbox: BBox,
}

impl Footprint {
    /// Build a footprint from spans in any order.
    ///
    /// Spans on the same row that touch or overlap are merged.
    pub fn from_spans(mut spans: Vec<Span>) -> Result<Self> {
        if let Some(bad) = spans.iter().find(|s| s.x1 < s.x0) {
            return Err(ImageError::InvalidInput(format!(
                "span on row {} ends at {} before it starts at {}",
                bad.y, bad.x1, bad.x0
            )));
        }
        if spans.is_empty() {
            return Err(ImageError::EmptyFootprint);
        }

        spans.sort();
        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if last.y == span.y && span.x0 <= last.x1 + 1 => {
                    last.x1 = last.x1.max(span.x1);
                }
                _ => merged.push(span),
            }
        }

        let mut bbox = BBox::empty();
        for span in &merged {
            bbox.expand_to_include(span.x0, span.y);
            bbox.expand_to_include(span.x1, span.y);
        }

        Ok(Self {
            spans: merged,
            bbox,
        })
    }

    /// Footprint covering every pixel of `bbox`.
    pub fn from_bbox(bbox: BBox) -> Result<Self> {
        let bbox = bbox.validated()?;
        let spans = (bbox.min_y..=bbox.max_y)
            .map(|y| Span::new(y, bbox.min_x, bbox.max_x))
            .collect();
        Self::from_spans(spans)
    }

    /// Pixels whose centers lie within `radius` of `center`.
    pub fn circle(center: Point2I, radius: f64) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(ImageError::InvalidInput(format!(
                "circle radius must be non-negative, got {radius}"
            )));
        }

        let r = radius.floor() as i32;
        let spans = (-r..=r)
            .map(|dy| {
                let half = (radius * radius - (dy * dy) as f64).sqrt().floor() as i32;
                Span::new(center.y + dy, center.x - half, center.x + half)
            })
            .collect();
        Self::from_spans(spans)
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.spans.iter().any(|s| s.contains(x, y))
    }

    /// Pixel coordinates `(x, y)` in span order.
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.spans
            .iter()
            .flat_map(|s| (s.x0..=s.x1).map(move |x| (x, s.y)))
    }
}

/// Footprint carrying its own image, mask and variance values.
#[derive(Debug, Clone, PartialEq)]
pub struct HeavyFootprint {
    footprint: Footprint,
    image: Vec<f32>,
    mask: Vec<u32>,
    variance: Vec<f32>,
}

impl HeavyFootprint {
    /// Copy the footprint's pixels out of `masked_image`.
    pub fn from_masked_image(footprint: &Footprint, masked_image: &MaskedImage) -> Result<Self> {
        if !masked_image.bbox().contains(&footprint.bbox()) {
            return Err(ImageError::OutOfBounds {
                inner: footprint.bbox(),
                outer: masked_image.bbox(),
            });
        }

        let area = footprint.area();
        let mut image = Vec::with_capacity(area);
        let mut mask = Vec::with_capacity(area);
        let mut variance = Vec::with_capacity(area);

        let (img, msk, var) = (
            masked_image.image(),
            masked_image.mask(),
            masked_image.variance(),
        );
        for (x, y) in footprint.pixels() {
            let (Some(&i), Some(&m), Some(&v)) = (img.get(x, y), msk.get(x, y), var.get(x, y))
            else {
                return Err(ImageError::OutOfBounds {
                    inner: BBox::from_coords(x, y, x, y),
                    outer: masked_image.bbox(),
                });
            };
            image.push(i);
            mask.push(m);
            variance.push(v);
        }

        Ok(Self {
            footprint: footprint.clone(),
            image,
            mask,
            variance,
        })
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn bbox(&self) -> BBox {
        self.footprint.bbox()
    }

    /// Image values in span order.
    pub fn image_values(&self) -> &[f32] {
        &self.image
    }

    pub fn mask_values(&self) -> &[u32] {
        &self.mask
    }

    pub fn variance_values(&self) -> &[f32] {
        &self.variance
    }

    /// Write the image values into `dest`, whose `[0, 0]` element is parent pixel `origin`.
    ///
    /// Pixels of `dest` outside the footprint are left untouched.
    pub fn expand_array(&self, dest: &mut ArrayViewMut2<f32>, origin: Point2I) -> Result<()> {
        let (rows, cols) = dest.dim();
        let dest_box = BBox::from_corner_size(origin, cols, rows);
        if !dest_box.contains(&self.bbox()) {
            return Err(ImageError::OutOfBounds {
                inner: self.bbox(),
                outer: dest_box,
            });
        }

        for ((x, y), &value) in self.footprint.pixels().zip(&self.image) {
            let row = (y - origin.y) as usize;
            let col = (x - origin.x) as usize;
            dest[[row, col]] = value;
        }
        Ok(())
    }

    /// Render the footprint onto its (optionally grown) bounding box.
    ///
    /// Pixels outside the footprint hold `badfill`, typically NaN so they
    /// stand out from real data when displayed.
    pub fn subimage(&self, badfill: f32, grow: usize) -> Result<Image> {
        let bbox = self.bbox().grow(grow)?;
        let mut image = Image::new(bbox, badfill)?;
        self.expand_array(&mut image.array_mut(), bbox.min())?;
        Ok(image)
    }
}

/// Footprint attached to a catalog record, light or heavy.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFootprint {
    Light(Footprint),
    Heavy(HeavyFootprint),
}

impl SourceFootprint {
    pub fn is_heavy(&self) -> bool {
        matches!(self, SourceFootprint::Heavy(_))
    }

    /// Pixel region, regardless of heaviness.
    pub fn footprint(&self) -> &Footprint {
        match self {
            SourceFootprint::Light(fp) => fp,
            SourceFootprint::Heavy(hfp) => hfp.footprint(),
        }
    }

    pub fn bbox(&self) -> BBox {
        self.footprint().bbox()
    }

    pub fn as_heavy(&self) -> Option<&HeavyFootprint> {
        match self {
            SourceFootprint::Heavy(hfp) => Some(hfp),
            SourceFootprint::Light(_) => None,
        }
    }

    /// Heavy version of this footprint with values taken from `masked_image`.
    pub fn to_heavy(&self, masked_image: &MaskedImage) -> Result<HeavyFootprint> {
        HeavyFootprint::from_masked_image(self.footprint(), masked_image)
    }
}

impl From<Footprint> for SourceFootprint {
    fn from(fp: Footprint) -> Self {
        SourceFootprint::Light(fp)
    }
}

impl From<HeavyFootprint> for SourceFootprint {
    fn from(hfp: HeavyFootprint) -> Self {
        SourceFootprint::Heavy(hfp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp_masked_image() -> MaskedImage {
        let bbox = BBox::from_coords(0, 0, 9, 9);
        let data = Array2::from_shape_fn(bbox.dim(), |(r, c)| (r * 100 + c) as f32);
        let image = Image::with_bbox(bbox, data).unwrap();
        let mut mi = MaskedImage::from_bbox(bbox).unwrap();
        *mi.image_mut() = image;
        mi
    }

    #[test]
    fn test_spans_merge_and_sort() {
        let fp = Footprint::from_spans(vec![
            Span::new(3, 5, 6),
            Span::new(2, 1, 2),
            Span::new(3, 2, 4),
            Span::new(3, 9, 9),
        ])
        .unwrap();
        assert_eq!(
            fp.spans(),
            &[Span::new(2, 1, 2), Span::new(3, 2, 6), Span::new(3, 9, 9)]
        );
        assert_eq!(fp.bbox(), BBox::from_coords(1, 2, 9, 3));
        assert_eq!(fp.area(), 2 + 5 + 1);
    }

    #[test]
    fn test_invalid_spans_rejected() {
        assert_eq!(
            Footprint::from_spans(vec![]),
            Err(ImageError::EmptyFootprint)
        );
        assert!(matches!(
            Footprint::from_spans(vec![Span::new(0, 3, 2)]),
            Err(ImageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_circle() {
        let fp = Footprint::circle(Point2I::new(5, 5), 1.0).unwrap();
        // A plus sign.
        assert_eq!(fp.area(), 5);
        assert!(fp.contains(5, 4));
        assert!(!fp.contains(4, 4));
        assert_eq!(fp.bbox(), BBox::from_coords(4, 4, 6, 6));

        let fp = Footprint::circle(Point2I::new(0, 0), 2.5).unwrap();
        assert_eq!(fp.bbox(), BBox::from_coords(-2, -2, 2, 2));
        assert_eq!(fp.area(), 21);
    }

    #[test]
    fn test_from_bbox_covers_every_pixel() {
        let bbox = BBox::from_coords(-1, 2, 3, 4);
        let fp = Footprint::from_bbox(bbox).unwrap();
        assert_eq!(fp.area(), bbox.area());
        assert_eq!(fp.bbox(), bbox);
    }

    #[test]
    fn test_heavy_copies_values_in_span_order() {
        let mi = ramp_masked_image();
        let fp = Footprint::from_spans(vec![Span::new(2, 3, 4), Span::new(5, 1, 1)]).unwrap();
        let hfp = HeavyFootprint::from_masked_image(&fp, &mi).unwrap();
        assert_eq!(hfp.image_values(), &[203.0, 204.0, 501.0]);
        assert_eq!(hfp.mask_values(), &[0, 0, 0]);
        assert_eq!(hfp.variance_values(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_heavy_requires_footprint_inside_image() {
        let mi = ramp_masked_image();
        let fp = Footprint::from_spans(vec![Span::new(9, 8, 10)]).unwrap();
        assert!(matches!(
            HeavyFootprint::from_masked_image(&fp, &mi),
            Err(ImageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_subimage_fills_outside_with_badfill() {
        let mi = ramp_masked_image();
        let fp = Footprint::circle(Point2I::new(4, 4), 1.0).unwrap();
        let hfp = HeavyFootprint::from_masked_image(&fp, &mi).unwrap();

        let sub = hfp.subimage(f32::NAN, 0).unwrap();
        assert_eq!(sub.bbox(), fp.bbox());
        for y in 3..=5 {
            for x in 3..=5 {
                let value = *sub.get(x, y).unwrap();
                if fp.contains(x, y) {
                    assert_eq!(value, mi.image().get(x, y).copied().unwrap());
                } else {
                    assert!(value.is_nan());
                }
            }
        }
    }

    #[test]
    fn test_subimage_grow() {
        let mi = ramp_masked_image();
        let fp = Footprint::from_bbox(BBox::from_coords(4, 4, 5, 5)).unwrap();
        let hfp = HeavyFootprint::from_masked_image(&fp, &mi).unwrap();
        let sub = hfp.subimage(-1.0, 2).unwrap();
        assert_eq!(sub.bbox(), BBox::from_coords(2, 2, 7, 7));
        assert_eq!(*sub.get(2, 2).unwrap(), -1.0);
        assert_eq!(*sub.get(4, 5).unwrap(), 504.0);
    }

    #[test]
    fn test_expand_array_checks_destination() {
        let mi = ramp_masked_image();
        let fp = Footprint::from_bbox(BBox::from_coords(4, 4, 5, 5)).unwrap();
        let hfp = HeavyFootprint::from_masked_image(&fp, &mi).unwrap();
        let mut dest = Array2::<f32>::zeros((2, 2));
        assert!(hfp
            .expand_array(&mut dest.view_mut(), Point2I::new(5, 4))
            .is_err());
        hfp.expand_array(&mut dest.view_mut(), Point2I::new(4, 4))
            .unwrap();
        assert_eq!(dest[[1, 0]], 504.0);
    }

    #[test]
    fn test_source_footprint_upgrade() {
        let mi = ramp_masked_image();
        let light: SourceFootprint = Footprint::circle(Point2I::new(3, 3), 1.5)
            .unwrap()
            .into();
        assert!(!light.is_heavy());
        assert!(light.as_heavy().is_none());

        let heavy: SourceFootprint = light.to_heavy(&mi).unwrap().into();
        assert!(heavy.is_heavy());
        assert_eq!(heavy.footprint(), light.footprint());
        assert_eq!(heavy.bbox(), light.bbox());
    }
}
